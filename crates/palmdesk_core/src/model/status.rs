//! Per-field save status.
//!
//! # Invariants
//! - At most one of `is_saving`, `is_saved`, `has_error` is true.
//! - `error_message` is set only while `has_error` is true.

use serde::{Deserialize, Serialize};

/// Snapshot of one field's autosave state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStatus<T> {
    /// Value changed since the last confirmed save or explicit clear.
    pub is_dirty: bool,
    /// A gateway call is in flight.
    pub is_saving: bool,
    /// Last save succeeded; cleared by the saved-flash timer.
    pub is_saved: bool,
    pub has_error: bool,
    pub error_message: Option<String>,
    /// Seed value until the first successful save.
    pub last_saved_value: Option<T>,
}

impl<T> FieldStatus<T> {
    /// Clean status for a freshly seeded field.
    pub fn seeded(value: T) -> Self {
        Self {
            is_dirty: false,
            is_saving: false,
            is_saved: false,
            has_error: false,
            error_message: None,
            last_saved_value: Some(value),
        }
    }

    /// Idle: nothing pending, nothing to flash, no error.
    pub fn is_idle(&self) -> bool {
        !self.is_dirty && !self.is_saving && !self.is_saved && !self.has_error
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.is_saving = false;
        self.is_saved = false;
        self.has_error = true;
        self.error_message = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.has_error = false;
        self.error_message = None;
    }

    /// Holds for every status the controller publishes.
    pub fn outcome_flags_are_exclusive(&self) -> bool {
        let raised = [self.is_saving, self.is_saved, self.has_error]
            .iter()
            .filter(|flag| **flag)
            .count();
        raised <= 1 && (self.has_error || self.error_message.is_none())
    }
}

impl<T> Default for FieldStatus<T> {
    fn default() -> Self {
        Self {
            is_dirty: false,
            is_saving: false,
            is_saved: false,
            has_error: false,
            error_message: None,
            last_saved_value: None,
        }
    }
}
