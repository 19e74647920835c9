//! HTTP client for the relay server's /status and /call endpoints

use relay_core::{CallRequest, Error, Result, ServerStatus};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, instrument};

/// HTTP client for the local relay server
///
/// The relay performs the actual outbound request on our behalf: we hand
/// it `{base, path}` and render whatever JSON it returns. The client has
/// no knowledge of what the relay dispatches.
pub struct RelayClient {
    http: Client,
    server_base: String,
}

impl RelayClient {
    /// Create a new client for the relay at `server_base`
    /// (e.g. `http://127.0.0.1:8000`, no trailing slash required)
    pub fn new(server_base: &str) -> Self {
        Self {
            http: Client::new(),
            server_base: server_base.trim_end_matches('/').to_string(),
        }
    }

    /// The relay server address this client talks to.
    ///
    /// Doubles as the default origin when the user leaves the API base
    /// empty and supplies a relative path.
    pub fn server_base(&self) -> &str {
        &self.server_base
    }

    /// One-shot health probe against GET /status.
    ///
    /// Any 2xx response means connected; any failure or non-2xx means
    /// disconnected. The body is not consulted.
    #[instrument(skip(self))]
    pub async fn probe_status(&self) -> bool {
        let url = format!("{}/status", self.server_base);
        match self.http.get(&url).send().await {
            Ok(resp) => {
                debug!("Status probe response: {}", resp.status());
                resp.status().is_success()
            }
            Err(e) => {
                debug!("Status probe failed: {}", e);
                false
            }
        }
    }

    /// Fetch and parse the /status body (used by the console `status` command)
    #[instrument(skip(self))]
    pub async fn fetch_status(&self) -> Result<ServerStatus> {
        let url = format!("{}/status", self.server_base);

        let response = self.http.get(&url).send().await?;

        let response = response.error_for_status().map_err(|e| {
            error!("Status request failed: {}", e);
            Error::Api(e.to_string())
        })?;

        let status: ServerStatus = response.json().await.map_err(|e| {
            error!("Failed to parse status response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Server status: {}", status.status);
        Ok(status)
    }

    /// POST `{base, path}` to the relay's /call endpoint and return the
    /// JSON response verbatim
    #[instrument(skip(self))]
    pub async fn call(&self, base: &str, path: &str) -> Result<Value> {
        let url = format!("{}/call", self.server_base);
        let body = CallRequest {
            base: base.to_string(),
            path: path.to_string(),
        };

        debug!("Relaying call: base={} path={}", body.base, body.path);

        let response = self.http.post(&url).json(&body).send().await?;

        // The relay reports upstream failures as JSON bodies with error
        // status codes; surface those bodies instead of a bare status line.
        let status = response.status();
        let data: Value = response.json().await.map_err(|e| {
            error!("Failed to parse /call response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Relay /call responded with HTTP {}", status);
        Ok(data)
    }
}
