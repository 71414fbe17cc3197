#![allow(dead_code)]

use async_trait::async_trait;
use palmdesk_core::{
    now_epoch_ms, AutosaveRecord, DurableFieldStore, MemoryKeyValueStorage, SaveConfirmation,
    SaveError, SaveGateway, SIMULATED_NETWORK_ERROR,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const GATEWAY_LATENCY: Duration = Duration::from_millis(300);

/// Gateway fake that records every submitted record.
pub struct RecordingGateway {
    calls: Mutex<Vec<AutosaveRecord>>,
    latencies: Mutex<VecDeque<Duration>>,
    fail: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            latencies: Mutex::new(VecDeque::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let gateway = Self::new();
        gateway.set_failing(true);
        gateway
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Latencies consumed by the next calls, in order; then `GATEWAY_LATENCY`.
    pub fn script_latencies(&self, latencies: &[Duration]) {
        self.latencies.lock().unwrap().extend(latencies.iter().copied());
    }

    pub fn calls(&self) -> Vec<AutosaveRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saved_values(&self) -> Vec<serde_json::Value> {
        self.calls().into_iter().map(|record| record.value).collect()
    }
}

#[async_trait]
impl SaveGateway for RecordingGateway {
    async fn save(&self, record: &AutosaveRecord) -> Result<SaveConfirmation, SaveError> {
        self.calls.lock().unwrap().push(record.clone());
        let latency = self
            .latencies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(GATEWAY_LATENCY);
        tokio::time::sleep(latency).await;

        if self.fail.load(Ordering::SeqCst) {
            return Err(SaveError::Network(SIMULATED_NETWORK_ERROR.to_string()));
        }
        Ok(SaveConfirmation {
            message: "Data saved successfully".to_string(),
            record: record.clone(),
            saved_at: now_epoch_ms(),
            save_id: Uuid::new_v4(),
        })
    }
}

pub fn memory_store() -> Arc<DurableFieldStore> {
    Arc::new(DurableFieldStore::new(Arc::new(MemoryKeyValueStorage::new())))
}

/// Advances paused time and lets woken tasks run.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
