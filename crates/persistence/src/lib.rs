//! Relay Persistence - SQLite-backed settings storage

pub mod sqlite;

pub use sqlite::Database;
