//! User-triggered console actions: call, base, save, reset, clear, status

use crate::panels::{ConsolePanel, ConsoleStatus};
use relay_core::StatusSink;
use relay_networking::{api, RelayClient};
use relay_persistence::{sqlite, Database};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Everything the command handlers need, wired once at startup
pub struct ConsoleCtx {
    pub client: RelayClient,
    pub db: Database,
    pub status: Arc<ConsoleStatus>,
    pub output: Arc<ConsolePanel>,
    pub api_output: Arc<ConsolePanel>,
    /// The "API base" input field of the original UI
    pub base_input: Mutex<String>,
}

impl ConsoleCtx {
    pub fn base_input(&self) -> String {
        self.base_input.lock().unwrap().clone()
    }

    /// Type into the base field (not persisted until `save`)
    pub fn set_base_input(&self, value: &str) {
        *self.base_input.lock().unwrap() = value.trim().to_string();
        println!("API base set to '{}' (use 'save' to persist)", self.base_input());
    }

    /// Proxy one call through the relay and render the result
    pub async fn call(&self, path: &str) {
        let base = self.base_input();
        api::invoke_call(
            &self.client,
            &base,
            path,
            self.output.as_ref(),
            self.api_output.as_ref(),
        )
        .await;
    }

    /// Persist the base field; empty input stores nothing
    pub async fn save(&self) {
        let base = self.base_input();
        match sqlite::save_api_base(self.db.pool(), &base).await {
            Ok(true) => println!("Saved"),
            Ok(false) => println!("Nothing to save (API base is empty)"),
            Err(e) => println!("Error: {}", e),
        }
    }

    /// Drop the persisted base and clear the field
    pub async fn reset(&self) {
        match sqlite::reset_api_base(self.db.pool()).await {
            Ok(()) => {
                self.base_input.lock().unwrap().clear();
                println!("Reset");
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    /// Clear both panels
    pub fn clear(&self) {
        use relay_core::OutputSink;
        self.output.clear();
        self.api_output.clear();
        println!("Cleared");
    }

    /// Re-probe the server and print its status body
    pub async fn status(&self) {
        match self.client.fetch_status().await {
            Ok(body) => {
                self.status.set_connected(true);
                let when = body
                    .time
                    .map(|t| {
                        chrono::DateTime::from_timestamp(t as i64, 0)
                            .map(|dt| dt.to_rfc3339())
                            .unwrap_or_else(|| t.to_string())
                    })
                    .unwrap_or_else(|| "unknown".to_string());
                println!("Server: {} (server time {})", body.status, when);
            }
            Err(e) => {
                self.status.set_connected(false);
                info!("Status command probe failed: {}", e);
                println!("Server unreachable: {}", e);
            }
        }
        println!("Status: {}", self.status.label());
    }
}
