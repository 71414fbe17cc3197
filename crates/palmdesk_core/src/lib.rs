//! Core autosave pipeline for the PalmDesk supply-chain dashboard.
//! Form pages bind fields to this crate; rendering stays in the host.

pub mod autosave;
pub mod binding;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod presentation;
pub mod storage;
pub mod store;

pub use autosave::controller::{
    AutosaveController, AutosaveOptions, FieldValue, SeedSource, SAVED_FLASH_DURATION,
};
pub use autosave::validation::{ValidationResult, Validator};
pub use binding::text_field::{
    AutosaveTextField, FieldKind, FieldView, TextFieldProps, DEFAULT_SETTLE_WINDOW,
};
pub use config::{AutosaveSettings, ConfigError, GatewaySettings};
pub use gateway::{
    SaveConfirmation, SaveError, SaveGateway, SaveResponse, SimulatedSaveGateway,
    SIMULATED_NETWORK_ERROR,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::record::{now_epoch_ms, AutosaveRecord, FieldKey, StoredRecord};
pub use model::status::FieldStatus;
pub use presentation::{indicator_for, StatusColor, StatusIcon, StatusIndicator};
pub use storage::{KeyValueStorage, MemoryKeyValueStorage, SqliteKeyValueStorage, StorageError};
pub use store::field_store::{DurableFieldStore, DEFAULT_NAMESPACE};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
