//! Wire models for the relay server endpoints

use serde::{Deserialize, Serialize};

/// Request body for POST /call
///
/// The relay dispatches `base + path` on our behalf and returns
/// whatever JSON the upstream produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub base: String,
    pub path: String,
}

/// Response body from GET /status
///
/// The health probe only looks at the HTTP status class; the body is
/// parsed opportunistically for the console `status` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    /// Server clock, seconds since the epoch
    #[serde(default)]
    pub time: Option<f64>,
}
