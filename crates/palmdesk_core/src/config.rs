//! Autosave runtime settings.
//!
//! # Responsibility
//! - Load autosave tuning (debounce, flash window, storage key, simulated
//!   gateway behavior) from JSON with per-field defaults.
//!
//! # Invariants
//! - Every field is optional in the source document.
//! - Loaded settings are validated before use.

use crate::autosave::controller::{AutosaveOptions, SAVED_FLASH_DURATION};
use crate::gateway::{SimulatedSaveGateway, DEFAULT_FAILURE_RATE, DEFAULT_LATENCY};
use crate::store::field_store::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read settings: {err}"),
            Self::Parse(err) => write!(f, "failed to parse settings: {err}"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Simulated gateway knobs; replaced wholesale by a real backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub latency_ms: u64,
    pub failure_rate: f64,
    /// Fixed RNG seed for reproducible failure sequences.
    pub seed: Option<u64>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            latency_ms: duration_ms(DEFAULT_LATENCY),
            failure_rate: DEFAULT_FAILURE_RATE,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSettings {
    pub debounce_ms: u64,
    pub saved_flash_ms: u64,
    pub storage_key: String,
    pub log_level: Option<String>,
    pub gateway: GatewaySettings,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            saved_flash_ms: duration_ms(SAVED_FLASH_DURATION),
            storage_key: DEFAULT_NAMESPACE.to_string(),
            log_level: None,
            gateway: GatewaySettings::default(),
        }
    }
}

impl AutosaveSettings {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage_key cannot be empty".to_string(),
            ));
        }
        let rate = self.gateway.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "gateway.failure_rate must be within [0, 1], got {rate}"
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn saved_flash(&self) -> Duration {
        Duration::from_millis(self.saved_flash_ms)
    }

    /// Applies debounce and flash timing to controller options.
    pub fn apply<T>(&self, options: AutosaveOptions<T>) -> AutosaveOptions<T> {
        options
            .with_delay(self.debounce())
            .with_saved_flash(self.saved_flash())
    }

    pub fn simulated_gateway(&self) -> SimulatedSaveGateway {
        let latency = Duration::from_millis(self.gateway.latency_ms);
        match self.gateway.seed {
            Some(seed) => SimulatedSaveGateway::with_seed(latency, self.gateway.failure_rate, seed),
            None => SimulatedSaveGateway::new(latency, self.gateway.failure_rate),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{AutosaveSettings, ConfigError};
    use std::time::Duration;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = AutosaveSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, AutosaveSettings::default());
        assert_eq!(settings.saved_flash(), Duration::from_millis(2000));
        assert_eq!(settings.debounce(), Duration::ZERO);
        assert_eq!(settings.storage_key, "autosave_data");
        assert_eq!(settings.gateway.latency_ms, 300);
        assert!((settings.gateway.failure_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_gateway_section_keeps_other_defaults() {
        let settings =
            AutosaveSettings::from_json_str(r#"{"debounce_ms": 500, "gateway": {"failure_rate": 0}}"#)
                .unwrap();
        assert_eq!(settings.debounce(), Duration::from_millis(500));
        assert_eq!(settings.gateway.latency_ms, 300);
        assert_eq!(settings.simulated_gateway().failure_rate(), 0.0);
    }

    #[test]
    fn out_of_range_failure_rate_is_rejected() {
        let err = AutosaveSettings::from_json_str(r#"{"gateway": {"failure_rate": 1.5}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("failure_rate")));
    }

    #[test]
    fn blank_storage_key_is_rejected() {
        let err = AutosaveSettings::from_json_str(r#"{"storage_key": " "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AutosaveSettings::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
