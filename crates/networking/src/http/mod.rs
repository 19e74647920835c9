//! Raw HTTP client for the relay server

mod client;

pub use client::RelayClient;
