//! Key/value settings storage plus the persisted API base URL
//!
//! The console remembers one value across runs: the user's API base URL,
//! stored under [`API_BASE_KEY`]. The generic get/set/delete helpers exist
//! so future settings land in the same table.

use relay_core::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Settings key holding the persisted API base URL
pub const API_BASE_KEY: &str = "demo_api_base";

/// Read a setting value, `None` if the key is absent
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<sqlx::Sqlite, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Insert or overwrite a setting value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

/// Delete a setting; deleting an absent key is not an error
pub async fn delete_setting(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

/// Load the persisted API base URL; absent key means the input starts empty
pub async fn load_api_base(pool: &SqlitePool) -> Result<Option<String>> {
    get_setting(pool, API_BASE_KEY).await
}

/// Persist the API base URL.
///
/// Empty input is a no-op, not an error. Returns whether a value was
/// actually written.
pub async fn save_api_base(pool: &SqlitePool, base: &str) -> Result<bool> {
    let base = base.trim();
    if base.is_empty() {
        debug!("save_api_base: empty input, nothing stored");
        return Ok(false);
    }
    set_setting(pool, API_BASE_KEY, base).await?;
    debug!("save_api_base: saved {}", base);
    Ok(true)
}

/// Remove the persisted API base URL
pub async fn reset_api_base(pool: &SqlitePool) -> Result<()> {
    delete_setting(pool, API_BASE_KEY).await?;
    debug!("reset_api_base: key removed");
    Ok(())
}
