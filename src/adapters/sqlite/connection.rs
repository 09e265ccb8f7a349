//! `SQLite` pools built from the `database` section of the configuration.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::DatabaseConfig;

/// Writers wait this long on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Database path is empty")]
    EmptyPath,
    #[error("Failed to create database directory {path}: {source}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open database {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: sqlx::Error,
    },
}

/// File path named by a configured database location. A leading `sqlite:`
/// or `sqlite://` scheme is accepted and dropped.
pub fn database_file(configured: &str) -> &Path {
    let trimmed = configured.trim();
    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    Path::new(path)
}

/// Open the configured database file, creating it and its directory on first use.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, ConnectionError> {
    let file = database_file(&config.path);
    if file.as_os_str().is_empty() {
        return Err(ConnectionError::EmptyPath);
    }
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
        std::fs::create_dir_all(parent).map_err(|source| ConnectionError::DirectoryCreationFailed {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(file)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let max_connections = config.max_connections.max(1);
    debug!(path = %file.display(), max_connections, "opening database pool");

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::OpenFailed {
            path: file.display().to_string(),
            source,
        })
}

/// Single-connection in-memory pool. Every connection to `:memory:` is a
/// separate database, so the pool never grows past one.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let options = SqliteConnectOptions::new().filename(":memory:").foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::OpenFailed {
            path: ":memory:".to_string(),
            source,
        })
}
