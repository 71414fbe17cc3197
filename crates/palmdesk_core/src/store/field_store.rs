//! Field store over one serialized blob in host key-value storage.
//!
//! # Responsibility
//! - Upsert, read, and clear per-field records keyed by `(form_id, field_name)`.
//! - Answer form-level queries (presence, snapshot, last save time).
//!
//! # Invariants
//! - The whole mapping is serialized to one JSON blob under `namespace` on
//!   every mutation, so each write costs O(total stored fields). This is
//!   sized for form fields, not for high-churn data.
//! - A missing or corrupt blob reads as empty; unreadable entries are skipped.
//! - A mutation whose read fails writes nothing, so a transient storage
//!   error never replaces the blob with a partial mapping.
//! - A namespace left without records is removed from storage.
//! - Stored `timestamp` strictly increases per key.
//! - Read-modify-write cycles are serialized so writes to different keys
//!   never drop each other.

use crate::model::record::{now_epoch_ms, storage_key, AutosaveRecord, StoredRecord};
use crate::storage::{KeyValueStorage, StorageResult};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Default storage key holding the serialized mapping.
pub const DEFAULT_NAMESPACE: &str = "autosave_data";

type RecordMap = BTreeMap<String, StoredRecord>;

/// Process-wide durable store of autosaved field values.
pub struct DurableFieldStore {
    storage: Arc<dyn KeyValueStorage>,
    namespace: String,
    write_lock: Mutex<()>,
}

impl DurableFieldStore {
    /// Creates a store under [`DEFAULT_NAMESPACE`].
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_namespace(storage, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(storage: Arc<dyn KeyValueStorage>, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the last persisted value for the field, if any.
    pub fn get_value(&self, form_id: &str, field_name: &str) -> Option<Value> {
        self.load()
            .remove(&storage_key(form_id, field_name))
            .map(|record| record.value)
    }

    /// Returns the persisted value decoded as `T`.
    ///
    /// A value that no longer decodes as `T` is treated as absent.
    pub fn get_typed<T: DeserializeOwned>(&self, form_id: &str, field_name: &str) -> Option<T> {
        let value = self.get_value(form_id, field_name)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(
                    "event=store_read module=autosave_store status=error error_code=value_type_mismatch form_id={} field={} error={}",
                    form_id, field_name, err
                );
                None
            }
        }
    }

    /// Returns the full persisted record for the field.
    pub fn get_record(&self, form_id: &str, field_name: &str) -> Option<StoredRecord> {
        self.load().remove(&storage_key(form_id, field_name))
    }

    /// Upserts `record`, stamping it with the current time.
    pub fn set_field(&self, record: &AutosaveRecord) {
        let now = now_epoch_ms();
        let key = storage_key(&record.form_id, &record.field_name);
        self.mutate("set_field", |records| {
            let timestamp = records
                .get(&key)
                .map_or(now, |previous| now.max(previous.timestamp.saturating_add(1)));
            records.insert(
                key.clone(),
                StoredRecord {
                    form_id: record.form_id.clone(),
                    field_name: record.field_name.clone(),
                    value: record.value.clone(),
                    timestamp,
                    saved_at: now,
                },
            );
            true
        });
    }

    /// Removes one field.
    pub fn clear_field(&self, form_id: &str, field_name: &str) {
        let key = storage_key(form_id, field_name);
        self.mutate("clear_field", |records| records.remove(&key).is_some());
    }

    /// Removes every field belonging to `form_id`.
    pub fn clear_form(&self, form_id: &str) {
        self.mutate("clear_form", |records| {
            let before = records.len();
            records.retain(|_, record| record.form_id != form_id);
            records.len() != before
        });
    }

    pub fn has_form_data(&self, form_id: &str) -> bool {
        self.load().values().any(|record| record.form_id == form_id)
    }

    /// Snapshot of `field_name -> value` for one form.
    pub fn get_form_data(&self, form_id: &str) -> BTreeMap<String, Value> {
        self.load()
            .into_values()
            .filter(|record| record.form_id == form_id)
            .map(|record| (record.field_name, record.value))
            .collect()
    }

    /// Latest record timestamp across the form, in epoch milliseconds.
    pub fn get_last_saved_time(&self, form_id: &str) -> Option<i64> {
        self.load()
            .values()
            .filter(|record| record.form_id == form_id)
            .map(|record| record.timestamp)
            .max()
    }

    fn mutate(&self, op: &'static str, apply: impl FnOnce(&mut RecordMap) -> bool) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = match self.read_records() {
            Ok(records) => records,
            Err(err) => {
                error!(
                    "event=store_write module=autosave_store status=skipped op={} error_code=storage_read_failed namespace={} error={}",
                    op, self.namespace, err
                );
                return;
            }
        };
        if !apply(&mut records) {
            return;
        }
        if records.is_empty() {
            self.remove_blob(op);
        } else {
            self.persist(op, &records);
        }
    }

    fn load(&self) -> RecordMap {
        self.read_records().unwrap_or_else(|err| {
            error!(
                "event=store_load module=autosave_store status=error error_code=storage_read_failed namespace={} error={}",
                self.namespace, err
            );
            RecordMap::new()
        })
    }

    /// Storage errors propagate; a missing or corrupt blob is an empty map.
    fn read_records(&self) -> StorageResult<RecordMap> {
        let Some(raw) = self.storage.get_item(&self.namespace)? else {
            return Ok(RecordMap::new());
        };

        let entries: BTreeMap<String, Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=store_load module=autosave_store status=error error_code=corrupt_blob namespace={} error={}",
                    self.namespace, err
                );
                return Ok(RecordMap::new());
            }
        };

        Ok(entries
            .into_iter()
            .filter_map(|(key, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some((key, record)),
                Err(err) => {
                    warn!(
                        "event=store_load module=autosave_store status=skipped error_code=corrupt_entry key={} error={}",
                        key, err
                    );
                    None
                }
            })
            .collect())
    }

    fn remove_blob(&self, op: &'static str) {
        match self.storage.remove_item(&self.namespace) {
            Ok(()) => debug!(
                "event=store_write module=autosave_store status=ok op={} entries=0",
                op
            ),
            Err(err) => error!(
                "event=store_write module=autosave_store status=error op={} error_code=storage_remove_failed error={}",
                op, err
            ),
        }
    }

    fn persist(&self, op: &'static str, records: &RecordMap) {
        let blob = match serde_json::to_string(records) {
            Ok(blob) => blob,
            Err(err) => {
                error!(
                    "event=store_write module=autosave_store status=error op={} error_code=serialize_failed error={}",
                    op, err
                );
                return;
            }
        };

        match self.storage.set_item(&self.namespace, &blob) {
            Ok(()) => debug!(
                "event=store_write module=autosave_store status=ok op={} entries={} bytes={}",
                op,
                records.len(),
                blob.len()
            ),
            Err(err) => error!(
                "event=store_write module=autosave_store status=error op={} error_code=storage_write_failed error={}",
                op, err
            ),
        }
    }
}
