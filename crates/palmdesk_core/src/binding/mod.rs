//! Headless field bindings.
//!
//! # Responsibility
//! - Wire one labeled input surface to one autosave controller.
//! - Translate input, focus and blur events into controller calls.
//!
//! # Invariants
//! - Rendering is left to the host; bindings only produce view snapshots.
//! - Unmounting a binding disposes its controller.

pub mod text_field;
