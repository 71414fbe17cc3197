//! Per-field autosave state machine.
//!
//! # Responsibility
//! - Hold the current value and [`FieldStatus`] of one field.
//! - Debounce edits into gateway saves and write every settled save through
//!   to the [`DurableFieldStore`].
//! - Run the saved-flash expiry.
//!
//! # Invariants
//! - A new edit always cancels the pending debounced save before scheduling
//!   its own; at most one is pending.
//! - An in-flight gateway call is never cancelled by a new edit.
//! - Every issued save carries a monotonic sequence number; a completion that
//!   is not the latest issued changes neither the status nor the store.
//! - Timer tasks hold weak references and never outlive a disposed
//!   controller's state in a way that mutates it.
//!
//! # Runtime
//! - `set_value`, `save_now` and `retry` spawn onto the ambient Tokio runtime
//!   and panic when called outside one, like `tokio::spawn`.

use crate::autosave::validation::Validator;
use crate::gateway::SaveGateway;
use crate::model::record::{AutosaveRecord, FieldKey};
use crate::model::status::FieldStatus;
use crate::store::field_store::DurableFieldStore;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long `is_saved` stays raised after a successful save.
pub const SAVED_FLASH_DURATION: Duration = Duration::from_millis(2000);

/// Bounds every autosaved value type satisfies.
pub trait FieldValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> FieldValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Construction parameters for one controller.
pub struct AutosaveOptions<T> {
    pub form_id: String,
    pub field_name: String,
    /// Explicit value; wins over any stored draft.
    pub value: Option<T>,
    /// Used when neither an explicit nor a stored value exists.
    pub default_value: T,
    /// Debounce between an edit and its save. Zero saves on the next tick.
    pub delay: Duration,
    pub saved_flash: Duration,
    pub validator: Option<Validator<T>>,
}

impl<T> AutosaveOptions<T> {
    pub fn new(form_id: impl Into<String>, field_name: impl Into<String>, default_value: T) -> Self {
        Self {
            form_id: form_id.into(),
            field_name: field_name.into(),
            value: None,
            default_value,
            delay: Duration::ZERO,
            saved_flash: SAVED_FLASH_DURATION,
            validator: None,
        }
    }

    pub fn with_value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_saved_flash(mut self, saved_flash: Duration) -> Self {
        self.saved_flash = saved_flash;
        self
    }

    pub fn with_validator(mut self, validator: Validator<T>) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// Where the controller's initial value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Explicit,
    Stored,
    Default,
}

impl SeedSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Stored => "stored",
            Self::Default => "default",
        }
    }
}

struct State<T> {
    value: T,
    status: FieldStatus<T>,
    debounce: Option<JoinHandle<()>>,
    debounce_gen: u64,
    flash: Option<JoinHandle<()>>,
    flash_gen: u64,
    issued_seq: u64,
    /// Value of the latest issued save until that save settles.
    in_flight: Option<T>,
    disposed: bool,
}

impl<T> State<T> {
    fn cancel_debounce(&mut self) {
        self.debounce_gen += 1;
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }

    fn cancel_flash(&mut self) {
        self.flash_gen += 1;
        if let Some(handle) = self.flash.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for State<T> {
    fn drop(&mut self) {
        self.cancel_debounce();
        self.cancel_flash();
    }
}

struct Shared<T> {
    key: FieldKey,
    delay: Duration,
    saved_flash: Duration,
    validator: Option<Validator<T>>,
    store: Arc<DurableFieldStore>,
    gateway: Arc<dyn SaveGateway>,
    state: Mutex<State<T>>,
    status_tx: watch::Sender<FieldStatus<T>>,
}

impl<T: FieldValue> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State<T>) {
        self.status_tx.send_replace(state.status.clone());
    }

    /// Applies an edit: validate, then either stop on error or (re)schedule.
    fn apply_edit(self: &Arc<Self>, value: T, delay: Duration) {
        let verdict = self.validator.as_ref().map(|check| check(&value));

        let mut state = self.lock();
        state.value = value.clone();
        state.status.is_dirty = true;

        match verdict {
            Some(result) if !result.is_valid => {
                state.cancel_debounce();
                state.status.set_error(result.error_message());
                debug!(
                    "event=autosave_validate module=autosave status=invalid field={}",
                    self.key
                );
            }
            _ => {
                state.status.clear_error();
                state.cancel_debounce();
                let gen = state.debounce_gen;
                state.debounce = Some(tokio::spawn(debounced_save(
                    Arc::downgrade(self),
                    gen,
                    value,
                    delay,
                )));
            }
        }

        self.publish(&state);
    }

    fn schedule_flash_expiry(self: &Arc<Self>, state: &mut State<T>) {
        state.cancel_flash();
        let gen = state.flash_gen;
        let weak = Arc::downgrade(self);
        let saved_flash = self.saved_flash;
        state.flash = Some(tokio::spawn(async move {
            tokio::time::sleep(saved_flash).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut state = shared.lock();
            if state.flash_gen != gen {
                return;
            }
            state.flash = None;
            if state.status.is_saved {
                state.status.is_saved = false;
                shared.publish(&state);
            }
        }));
    }
}

async fn debounced_save<T: FieldValue>(weak: Weak<Shared<T>>, gen: u64, value: T, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(shared) = weak.upgrade() else {
        return;
    };
    {
        let mut state = shared.lock();
        if state.debounce_gen != gen || state.disposed {
            return;
        }
        // Past this point the save is in flight and no longer cancellable.
        state.debounce = None;
    }
    perform_save(shared, value).await;
}

async fn perform_save<T: FieldValue>(shared: Arc<Shared<T>>, value: T) {
    let seq = {
        let mut state = shared.lock();
        state.issued_seq += 1;
        state.in_flight = Some(value.clone());
        state.status.is_saving = true;
        state.status.is_saved = false;
        state.status.clear_error();
        shared.publish(&state);
        state.issued_seq
    };

    let encoded = match serde_json::to_value(&value) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!(
                "event=autosave_save module=autosave status=error error_code=encode_failed field={} seq={} error={}",
                shared.key, seq, err
            );
            let mut state = shared.lock();
            if state.issued_seq == seq {
                state.in_flight = None;
                state.status.set_error(format!("Failed to encode value: {err}"));
                shared.publish(&state);
            }
            return;
        }
    };

    let record = AutosaveRecord::now(&shared.key, encoded);
    debug!(
        "event=autosave_save module=autosave status=start field={} seq={}",
        shared.key, seq
    );
    let outcome = shared.gateway.save(&record).await;

    let mut state = shared.lock();
    if state.issued_seq != seq {
        debug!(
            "event=autosave_save module=autosave status=stale field={} seq={} latest_seq={}",
            shared.key, seq, state.issued_seq
        );
        return;
    }
    state.in_flight = None;

    // Local fallback is written whatever the gateway said.
    shared.store.set_field(&record);

    match outcome {
        Ok(confirmation) => {
            state.status.is_saving = false;
            // A pending edit made during the call keeps the field dirty.
            state.status.is_dirty = state.value != value;
            state.status.last_saved_value = Some(value);
            // has_error here can only come from an edit that failed validation
            // while the call was in flight; that error stays visible.
            if !state.status.has_error {
                state.status.is_saved = true;
                if !state.disposed {
                    shared.schedule_flash_expiry(&mut state);
                }
            }
            info!(
                "event=autosave_save module=autosave status=ok field={} seq={} save_id={}",
                shared.key, seq, confirmation.save_id
            );
        }
        Err(err) => {
            if state.status.has_error {
                state.status.is_saving = false;
            } else {
                state.status.set_error(err.message());
            }
            warn!(
                "event=autosave_save module=autosave status=error error_code=gateway_failed field={} seq={} error={}",
                shared.key, seq, err
            );
        }
    }
    shared.publish(&state);
}

/// Autosave controller bound to one field.
///
/// Consumer surface: [`value`](Self::value), [`set_value`](Self::set_value),
/// [`status`](Self::status), [`clear_status`](Self::clear_status).
/// Dropping the controller cancels its timers without flushing.
pub struct AutosaveController<T: FieldValue> {
    shared: Arc<Shared<T>>,
    seed_source: SeedSource,
}

impl<T: FieldValue> AutosaveController<T> {
    /// Creates a controller seeded by explicit value, then stored value,
    /// then default value.
    pub fn new(
        options: AutosaveOptions<T>,
        store: Arc<DurableFieldStore>,
        gateway: Arc<dyn SaveGateway>,
    ) -> Self {
        let key = FieldKey::new(options.form_id, options.field_name);
        let (initial, seed_source) = match options.value {
            Some(value) => (value, SeedSource::Explicit),
            None => match store.get_typed::<T>(&key.form_id, &key.field_name) {
                Some(value) => (value, SeedSource::Stored),
                None => (options.default_value, SeedSource::Default),
            },
        };

        debug!(
            "event=autosave_mount module=autosave status=ok field={} seed={}",
            key,
            seed_source.as_str()
        );

        let status = FieldStatus::seeded(initial.clone());
        let (status_tx, _) = watch::channel(status.clone());
        let shared = Arc::new(Shared {
            key,
            delay: options.delay,
            saved_flash: options.saved_flash,
            validator: options.validator,
            store,
            gateway,
            state: Mutex::new(State {
                value: initial,
                status,
                debounce: None,
                debounce_gen: 0,
                flash: None,
                flash_gen: 0,
                issued_seq: 0,
                in_flight: None,
                disposed: false,
            }),
            status_tx,
        });

        Self {
            shared,
            seed_source,
        }
    }

    pub fn key(&self) -> &FieldKey {
        &self.shared.key
    }

    pub fn seed_source(&self) -> SeedSource {
        self.seed_source
    }

    /// Current in-memory value, saved or not.
    pub fn value(&self) -> T {
        self.shared.lock().value.clone()
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> FieldStatus<T> {
        self.shared.lock().status.clone()
    }

    /// Debounce applied by [`set_value`](Self::set_value).
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Value of the gateway call currently awaited, if any.
    pub fn in_flight_value(&self) -> Option<T> {
        self.shared.lock().in_flight.clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<FieldStatus<T>> {
        self.shared.status_tx.subscribe()
    }

    /// Records an edit and schedules its save after the configured delay.
    ///
    /// An invalid value raises the validator's error, cancels any pending
    /// save and is never submitted.
    pub fn set_value(&self, value: T) {
        self.shared.apply_edit(value, self.shared.delay);
    }

    /// Like [`set_value`](Self::set_value) but saves on the next tick,
    /// bypassing the debounce. Validation still applies.
    pub fn save_now(&self, value: T) {
        self.set_value_after(value, Duration::ZERO);
    }

    /// Like [`set_value`](Self::set_value) with a per-edit debounce.
    pub fn set_value_after(&self, value: T, delay: Duration) {
        self.shared.apply_edit(value, delay);
    }

    /// Re-submits the current value, e.g. after a failed save.
    pub fn retry(&self) {
        self.save_now(self.value());
    }

    /// Clears dirty/saved/error flags; value and `last_saved_value` stay.
    pub fn clear_status(&self) {
        let mut state = self.shared.lock();
        state.status.is_dirty = false;
        state.status.is_saved = false;
        state.status.clear_error();
        self.shared.publish(&state);
    }
}

impl<T: FieldValue> Drop for AutosaveController<T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.disposed = true;
        state.cancel_debounce();
        state.cancel_flash();
        debug!(
            "event=autosave_dispose module=autosave status=ok field={}",
            self.shared.key
        );
    }
}
