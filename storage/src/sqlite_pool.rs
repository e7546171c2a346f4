//! SQLite connection pool wrapper for the storage crate.

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Manages a single SQLite pool shared by the repositories; creates the DB file if missing.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Creates a pool for the given database URL (file path, `sqlite:` URL, or `sqlite::memory:`).
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!("Initializing SQLite pool: {}", database_url);

        let in_memory = database_url.contains(":memory:");
        let options = if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)?.create_if_missing(true)
        } else {
            SqliteConnectOptions::new()
                .create_if_missing(true)
                .filename(database_url)
        };

        // An in-memory database exists per connection, so the pool must keep
        // exactly one connection alive for tables to survive across calls.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        Ok(Self { pool })
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
