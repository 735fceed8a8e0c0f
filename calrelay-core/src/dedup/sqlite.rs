//! Embedded key-value backend on SQLite.
//!
//! A single `ids` table maps each event id to a fixed sentinel; only the
//! presence of the key is meaningful.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{DedupStore, check_id};
use crate::error::{RelayError, RelayResult};

const SENTINEL: &str = "!";

/// Concurrent invocations against the same file wait this long for the
/// writer lock instead of failing immediately.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> RelayResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            RelayError::Store(format!("Failed to open {}: {}", path.display(), e))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ids (
                id    TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
        )?;

        debug!(path = %path.display(), "opened sqlite dedup store");
        Ok(SqliteStore { conn })
    }

    /// Number of recorded ids.
    pub fn len(&self) -> RelayResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ids", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> RelayResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl DedupStore for SqliteStore {
    fn exists(&self, id: &str) -> RelayResult<bool> {
        check_id(id)?;
        let found = self
            .conn
            .query_row("SELECT 1 FROM ids WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn record(&mut self, ids: &[String]) -> RelayResult<()> {
        for id in ids {
            check_id(id)?;
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO ids (id, value) VALUES (?1, ?2)")?;
            for id in ids {
                stmt.execute(params![id, SENTINEL])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
