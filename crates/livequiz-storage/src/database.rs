// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use livequiz_core::EngineError;

/// A single-writer SQLite handle: one [`tokio_rusqlite::Connection`], WAL
/// mode enabled, migrations applied on open.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if absent) the database at `path`, enables WAL mode,
    /// and runs all pending migrations.
    ///
    /// Migrations run against a plain blocking `rusqlite::Connection` before
    /// the `tokio_rusqlite` handle is established, since refinery's runner
    /// takes `&mut rusqlite::Connection` directly.
    pub async fn open(path: &str) -> Result<Self, EngineError> {
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), EngineError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(EngineError::storage)?;
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
                .map_err(EngineError::storage)?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(EngineError::storage)??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// Opens an in-memory database with migrations applied, for tests.
    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self, EngineError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(map_tr_err)?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            crate::migrations::run_migrations(conn).map_err(|_| {
                rusqlite::Error::InvalidParameterName("migration failed".to_string())
            })
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub async fn close(self) -> Result<(), EngineError> {
        self.conn.close().await.map_err(|(_, e)| EngineError::storage(e))
    }
}

/// Converts a `tokio_rusqlite::Error` (itself wrapping `rusqlite::Error` or a
/// closure panic) into the crate's error type.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> EngineError {
    EngineError::storage(err)
}
