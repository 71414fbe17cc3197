//! `kv_entries` schema upgrades, tracked in `PRAGMA user_version`.

use super::{StorageError, StorageResult};
use log::info;
use rusqlite::Connection;

/// Ordered upgrade scripts; entry `i` lifts the file to version `i + 1`.
const UPGRADES: &[&str] = &[include_str!("sql/v1_kv_entries.sql")];

/// Schema version this build writes.
pub const SCHEMA_VERSION: u32 = UPGRADES.len() as u32;

/// Brings `conn` up to [`SCHEMA_VERSION`] in one transaction.
///
/// A file stamped with a newer version is refused untouched.
pub(crate) fn upgrade(conn: &mut Connection) -> StorageResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for script in &UPGRADES[found as usize..] {
        tx.execute_batch(script)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    info!(
        "event=kv_schema_upgrade module=storage status=ok from_version={} to_version={}",
        found, SCHEMA_VERSION
    );
    Ok(())
}
