//! Reconnecting WebSocket feed for live relay messages
//!
//! The feed keeps at most one live socket at a time and retries forever
//! at a fixed interval. The event core lives in [`handler`] so the state
//! machine can be driven by synthetic events in tests; the tokio plumbing
//! lives in [`client`].

mod client;
mod handler;

pub use client::{spawn_feed, FeedHandle};
pub use handler::{Directive, FeedHandler};

use relay_core::{Error, Result};
use std::time::Duration;
use url::Url;

/// Fixed delay before a reconnect attempt
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Path segment the relay serves its feed on
pub const FEED_PATH: &str = "/ws";

/// Connection lifecycle state of the feed socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

/// Event produced by one socket handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Handshake completed
    Open,
    /// Socket ended, cleanly or not
    Closed,
    /// Transport error; always escalates into a forced close
    Error(String),
    /// Inbound text frame
    Message(String),
}

/// Configuration for the feed client
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Full ws:// or wss:// URL of the feed endpoint
    pub url: String,
    /// Delay between reconnect attempts (fixed, no backoff)
    pub reconnect_delay: Duration,
}

impl FeedConfig {
    /// Derive the feed URL from the relay server address: the scheme maps
    /// `http -> ws` and `https -> wss`, the host stays, the path is
    /// [`FEED_PATH`].
    pub fn from_server_base(server_base: &str) -> Result<Self> {
        let mut url =
            Url::parse(server_base).map_err(|e| Error::Socket(format!("invalid server base: {}", e)))?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(Error::Socket(format!("unsupported scheme: {}", other)));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::Socket("failed to set feed scheme".to_string()))?;
        url.set_path(FEED_PATH);

        Ok(Self {
            url: url.to_string(),
            reconnect_delay: RECONNECT_DELAY,
        })
    }
}
