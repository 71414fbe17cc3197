//! Remote save gateway contract.
//!
//! # Responsibility
//! - Define the authoritative save sink the controller submits to.
//! - Define the wire envelope a real backend answers with.
//!
//! # Invariants
//! - Gateways are stateless between calls.
//! - The controller depends on `dyn SaveGateway` only, so a real backend can
//!   replace the simulated one without controller changes.

use crate::model::record::AutosaveRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod simulated;

pub use simulated::{
    SimulatedSaveGateway, DEFAULT_FAILURE_RATE, DEFAULT_LATENCY, SIMULATED_NETWORK_ERROR,
};

/// Authoritative save sink for one field record.
#[async_trait]
pub trait SaveGateway: Send + Sync {
    async fn save(&self, record: &AutosaveRecord) -> Result<SaveConfirmation, SaveError>;
}

/// Successful save acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveConfirmation {
    pub message: String,
    pub record: AutosaveRecord,
    /// Server-assigned save time, epoch milliseconds.
    pub saved_at: i64,
    /// Server-assigned identifier of this save.
    pub save_id: Uuid,
}

/// Save failure reported by a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// Transport failure; the backend never acknowledged the write.
    Network(String),
    /// Backend answered but refused the write.
    Rejected(String),
}

impl SaveError {
    /// Human-readable reason shown next to the field.
    pub fn message(&self) -> &str {
        match self {
            Self::Network(message) | Self::Rejected(message) => message,
        }
    }
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for SaveError {}

/// Saved record as echoed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedData {
    #[serde(flatten)]
    pub record: AutosaveRecord,
    pub saved_at: i64,
    #[serde(default = "Uuid::nil")]
    pub save_id: Uuid,
}

/// Response envelope: `{success, message, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SavedData>,
}

impl SaveResponse {
    /// Interprets the envelope; `success: true` without `data` is a rejection.
    pub fn into_result(self) -> Result<SaveConfirmation, SaveError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(SaveConfirmation {
                message: self.message,
                record: data.record,
                saved_at: data.saved_at,
                save_id: data.save_id,
            }),
            (true, None) => Err(SaveError::Rejected(
                "save acknowledged without saved data".to_string(),
            )),
            (false, _) => Err(SaveError::Rejected(self.message)),
        }
    }
}

impl From<Result<SaveConfirmation, SaveError>> for SaveResponse {
    fn from(value: Result<SaveConfirmation, SaveError>) -> Self {
        match value {
            Ok(confirmation) => Self {
                success: true,
                message: confirmation.message,
                data: Some(SavedData {
                    record: confirmation.record,
                    saved_at: confirmation.saved_at,
                    save_id: confirmation.save_id,
                }),
            },
            Err(err) => Self {
                success: false,
                message: err.message().to_string(),
                data: None,
            },
        }
    }
}
