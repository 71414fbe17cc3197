//! Field identity and persisted record shapes.
//!
//! # Invariants
//! - Storage keys are `"<form_id>_<field_name>"`.
//! - Wire/persisted fields use camelCase names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identity of one editable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub form_id: String,
    pub field_name: String,
}

impl FieldKey {
    pub fn new(form_id: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            field_name: field_name.into(),
        }
    }

    /// Key used inside the persisted mapping.
    pub fn storage_key(&self) -> String {
        storage_key(&self.form_id, &self.field_name)
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.form_id, self.field_name)
    }
}

pub(crate) fn storage_key(form_id: &str, field_name: &str) -> String {
    format!("{form_id}_{field_name}")
}

/// One field value submitted for saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveRecord {
    pub form_id: String,
    pub field_name: String,
    pub value: Value,
    /// Client-side edit time in epoch milliseconds.
    pub timestamp: i64,
}

impl AutosaveRecord {
    /// Builds a record for `key` stamped with the current time.
    pub fn now(key: &FieldKey, value: Value) -> Self {
        Self {
            form_id: key.form_id.clone(),
            field_name: key.field_name.clone(),
            value,
            timestamp: now_epoch_ms(),
        }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::new(self.form_id.as_str(), self.field_name.as_str())
    }
}

/// Record as held in the durable blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub form_id: String,
    pub field_name: String,
    pub value: Value,
    /// Strictly increasing per key across writes.
    pub timestamp: i64,
    /// Wall-clock time of the local write.
    pub saved_at: i64,
}

/// Current wall-clock time in epoch milliseconds.
///
/// Falls back to `0` if the system clock reads before the Unix epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
