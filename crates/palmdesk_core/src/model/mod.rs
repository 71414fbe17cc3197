//! Autosave domain records.
//!
//! # Responsibility
//! - Define the field identity, persisted record and status shapes shared by
//!   the store, the gateway and the controller.
//!
//! # Invariants
//! - A field is identified by `(form_id, field_name)` and nothing else.
//! - Timestamps are Unix epoch milliseconds.

pub mod record;
pub mod status;
