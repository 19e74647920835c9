//! Relay Core - Shared data models, sinks, and errors

pub mod errors;
pub mod models;
pub mod output;

pub use errors::{Error, Result};
pub use models::*;
pub use output::{OutputBuffer, OutputSink, OutputValue, StatusSink};
