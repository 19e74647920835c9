//! High-level wrappers over the raw relay client
//!
//! Adds the display-side behavior the raw client stays clear of: target
//! resolution, the `Calling …` line, and degrading failures to rendered
//! text instead of propagated errors.

mod proxy;

pub use proxy::*;
