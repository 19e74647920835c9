//! Error types and Result alias for the relay console

use thiserror::Error;

/// Main error type for the relay console
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Relay request failed: {0}")]
    Api(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("WebSocket error: {0}")]
    Socket(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
