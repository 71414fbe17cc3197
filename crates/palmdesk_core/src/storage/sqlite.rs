//! SQLite-backed key-value storage.
//!
//! # Invariants
//! - `kv_entries` is at [`SCHEMA_VERSION`](super::SCHEMA_VERSION) before any
//!   item is read or written.
//! - All statements run under one connection mutex.

use super::{schema, KeyValueStorage, StorageResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable storage over one SQLite connection.
pub struct SqliteKeyValueStorage {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStorage {
    /// Opens (creating when missing) a storage file in WAL mode.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        Self::connect("file", || {
            let conn = Connection::open(path)?;
            // journal_mode answers with a row, so execute_batch would reject it.
            conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
            Ok(conn)
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::connect("memory", || Ok(Connection::open_in_memory()?))
    }

    fn connect(
        mode: &'static str,
        open: impl FnOnce() -> StorageResult<Connection>,
    ) -> StorageResult<Self> {
        let started_at = Instant::now();
        let prepared = open().and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            schema::upgrade(&mut conn)?;
            Ok(conn)
        });

        match prepared {
            Ok(conn) => {
                info!(
                    "event=kv_open module=storage status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                error!(
                    "event=kv_open module=storage status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for SqliteKeyValueStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn().execute(
            "INSERT INTO kv_entries (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn()
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}
