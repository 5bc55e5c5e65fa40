//! Scoped database connections.
//!
//! Each tool call acquires its own connection and releases it before
//! returning; no connection is pooled or shared across requests. Connections
//! are opened read-only so the process cannot mutate the database even if a
//! statement slipped past validation.

use crate::config::Config;
use crate::error::{ExplorerError, ExplorerResult};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Opens and closes per-request SQLite connections for a fixed database path.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    db_path: PathBuf,
}

impl ConnectionManager {
    /// Create a connection manager for the configured database path.
    pub fn new(config: &Config) -> Self {
        Self {
            db_path: config.db_path.clone(),
        }
    }

    /// Create a connection manager for an explicit path (useful for testing).
    pub fn for_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// The configured database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a new read-only connection scoped to the calling request.
    ///
    /// Fails with [`ExplorerError::Connection`] if the file does not exist or
    /// is not a valid SQLite database. Validity is checked by probing the
    /// schema header, not just by path existence.
    pub async fn acquire(&self) -> ExplorerResult<SqliteConnection> {
        if !self.db_path.exists() {
            return Err(ExplorerError::connection(
                "database file not found at the configured path",
            ));
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .read_only(true)
            .create_if_missing(false);

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| ExplorerError::connection(format!("failed to open database: {e}")))?;

        // SQLite opens lazily; reading the schema version forces the file
        // header to be parsed so a non-database file fails here.
        if let Err(e) = sqlx::query("PRAGMA schema_version")
            .fetch_one(&mut conn)
            .await
        {
            let _ = conn.close().await;
            return Err(ExplorerError::connection(format!(
                "file is not a valid SQLite database: {e}"
            )));
        }

        debug!("Acquired read-only connection");
        Ok(conn)
    }

    /// Close a connection acquired from this manager.
    ///
    /// Called on every exit path; a close failure is logged but never
    /// surfaced, since the request outcome is already decided.
    pub async fn release(&self, conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close connection cleanly");
        }
    }
}
