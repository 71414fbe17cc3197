//! Durable per-field fallback store.
//!
//! # Responsibility
//! - Persist the latest value of every autosaved field locally so edits
//!   survive reloads even when the remote save fails.
//!
//! # Invariants
//! - Public store APIs never fail; storage problems are logged only.
//! - Writes are last-write-wins per field key.

pub mod field_store;
