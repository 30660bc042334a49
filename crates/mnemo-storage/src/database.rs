// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, migrations, and shutdown.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT open additional connections for writes.

use std::path::Path;

use mnemo_config::StorageConfig;
use mnemo_core::MnemoError;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Busy timeout applied to every connection, in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Map a tokio-rusqlite error into a storage error naming the operation.
pub fn map_tr_err(
    context: &'static str,
) -> impl FnOnce(tokio_rusqlite::Error<rusqlite::Error>) -> MnemoError {
    move |e| MnemoError::storage(context, e)
}

/// A migrated SQLite database behind a single-writer connection.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL journaling.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MnemoError> {
        Self::open_with(path, true).await
    }

    /// Open the database described by a storage config section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, MnemoError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    /// Open (or create) the database at `path`, choosing the journal mode.
    ///
    /// Missing parent directories are created first.
    pub async fn open_with(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, MnemoError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| MnemoError::storage("create database directory", e))?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| MnemoError::storage("open database", e))?;
        let db = Self::initialize(conn, wal_mode).await?;
        info!(path = %path.display(), wal_mode, "memory database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Mostly useful in tests.
    pub async fn open_in_memory() -> Result<Self, MnemoError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| MnemoError::storage("open in-memory database", e))?;
        Self::initialize(conn, false).await
    }

    async fn initialize(conn: Connection, wal_mode: bool) -> Result<Self, MnemoError> {
        conn.call(move |conn| -> Result<(), MnemoError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
            ))
            .map_err(|e| MnemoError::storage("configure database", e))?;
            run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => MnemoError::storage("initialize database", other),
        })?;

        debug!("database pragmas applied and migrations run");
        Ok(Self { conn })
    }

    /// The single-writer connection every query runs on.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MnemoError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err("checkpoint WAL"))?;
        debug!("WAL checkpoint complete");
        self.conn
            .close()
            .await
            .map_err(|e| MnemoError::storage("close database", e))
    }
}
