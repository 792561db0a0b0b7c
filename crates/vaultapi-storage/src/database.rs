// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_rusqlite::Connection;
use tracing::{debug, info};
use vaultapi_core::VaultError;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite file backing the secret store.
///
/// Cloning is cheap; every clone talks to the same background thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, VaultError> {
        Self::open_with(path, true).await
    }

    /// Open (or create) the database at `path`.
    ///
    /// `.db` is appended when the path has no such extension.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, VaultError> {
        let path = normalize_path(path);
        let conn = Connection::open(&path)
            .await
            .map_err(|e| VaultError::Store(e.to_string()))?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            if wal_mode {
                let mode: String = conn.pragma_update_and_check(
                    None,
                    "journal_mode",
                    "WAL",
                    |row| row.get(0),
                )?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path.display(), wal_mode, "database opened");
        Ok(Self { conn, path })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// On-disk location, after `.db` normalization.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Liveness check: runs `SELECT 1`.
    pub async fn ping(&self) -> Result<(), VaultError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn close(&self) -> Result<(), VaultError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Append `.db` unless the path already ends with it.
pub fn normalize_path(path: &str) -> PathBuf {
    if path.ends_with(".db") {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{path}.db"))
    }
}

/// Flatten a tokio-rusqlite error into a store error carrying SQLite's message.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> VaultError {
    match e {
        tokio_rusqlite::Error::Error(inner) => VaultError::Store(inner.to_string()),
        other => VaultError::Store(other.to_string()),
    }
}
