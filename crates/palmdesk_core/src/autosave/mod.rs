//! Field-level autosave pipeline.
//!
//! # Responsibility
//! - Own one field's value and save status for the lifetime of its binding.
//! - Debounce edits, gate them through validation, submit to the gateway and
//!   write through to the durable store.
//!
//! # Invariants
//! - At most one pending debounced save per field.
//! - Invalid values never reach the gateway.
//! - Failed saves are not retried automatically.

pub mod controller;
pub mod validation;
