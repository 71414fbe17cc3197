//! Development stand-in for the remote save backend.
//!
//! # Invariants
//! - Failure draws are independent of the submitted record.
//! - `failure_rate` is always within `[0, 1]`.

use super::{SaveConfirmation, SaveError, SaveGateway};
use crate::model::record::{now_epoch_ms, AutosaveRecord};
use async_trait::async_trait;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(300);
pub const DEFAULT_FAILURE_RATE: f64 = 0.1;
pub const SIMULATED_NETWORK_ERROR: &str = "Network error: Failed to save data";

const SUCCESS_MESSAGE: &str = "Data saved successfully";

/// Gateway that sleeps for `latency` and fails with probability `failure_rate`.
pub struct SimulatedSaveGateway {
    latency: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedSaveGateway {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self::with_rng(latency, failure_rate, StdRng::from_entropy())
    }

    /// Deterministic failure sequence for reproducible runs.
    pub fn with_seed(latency: Duration, failure_rate: f64, seed: u64) -> Self {
        Self::with_rng(latency, failure_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(latency: Duration, failure_rate: f64, rng: StdRng) -> Self {
        let failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        Self {
            latency,
            failure_rate,
            rng: Mutex::new(rng),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    fn draw_failure(&self) -> bool {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_bool(self.failure_rate)
    }
}

impl Default for SimulatedSaveGateway {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY, DEFAULT_FAILURE_RATE)
    }
}

#[async_trait]
impl SaveGateway for SimulatedSaveGateway {
    async fn save(&self, record: &AutosaveRecord) -> Result<SaveConfirmation, SaveError> {
        tokio::time::sleep(self.latency).await;

        if self.draw_failure() {
            warn!(
                "event=gateway_save module=gateway status=error error_code=simulated_network_failure form_id={} field={}",
                record.form_id, record.field_name
            );
            return Err(SaveError::Network(SIMULATED_NETWORK_ERROR.to_string()));
        }

        debug!(
            "event=gateway_save module=gateway status=ok form_id={} field={} latency_ms={}",
            record.form_id,
            record.field_name,
            self.latency.as_millis()
        );
        Ok(SaveConfirmation {
            message: SUCCESS_MESSAGE.to_string(),
            record: record.clone(),
            saved_at: now_epoch_ms(),
            save_id: Uuid::new_v4(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedSaveGateway;
    use std::time::Duration;

    #[test]
    fn failure_rate_is_clamped() {
        assert_eq!(SimulatedSaveGateway::new(Duration::ZERO, 3.0).failure_rate(), 1.0);
        assert_eq!(SimulatedSaveGateway::new(Duration::ZERO, -1.0).failure_rate(), 0.0);
        assert_eq!(
            SimulatedSaveGateway::new(Duration::ZERO, f64::NAN).failure_rate(),
            0.0
        );
    }
}
