//! Host key-value storage backing the durable field store.
//!
//! # Responsibility
//! - Define a small string key/value contract shaped like browser local
//!   storage (`get_item`, `set_item`, `remove_item`).
//! - Provide SQLite and in-memory implementations.
//!
//! # Invariants
//! - Implementations are shareable across threads (`Send + Sync`).
//! - `set_item` replaces the previous value for the key in place.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryKeyValueStorage;
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteKeyValueStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure raised by a storage backend.
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    /// The storage file carries a schema this build cannot read.
    SchemaTooNew { found: u32, supported: u32 },
    /// Backend refused the operation, e.g. quota exhausted or read-only medium.
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "storage schema v{found} was written by a newer build (this build reads up to v{supported})"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Local persistent string storage owned by the host process.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}
