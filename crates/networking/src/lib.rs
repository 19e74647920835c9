//! Relay Networking - HTTP client, proxy call wrapper, and the WebSocket feed

pub mod api;
pub mod http;
pub mod websocket;

pub use http::RelayClient;
pub use websocket::{spawn_feed, FeedConfig, FeedEvent, FeedHandle, FeedState};
