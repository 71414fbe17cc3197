//! Field validators supplied by host forms.
//!
//! # Invariants
//! - Validators are synchronous and side-effect free.
//! - Format validators accept empty input; combine with [`required`] to
//!   forbid it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});
// Indonesian mobile numbers: 08xx, 628xx or +628xx, 9-14 digits after the 8.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+62|62|0)8[0-9]{7,12}$").expect("valid phone regex"));
static PHONE_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-().]").expect("valid phone separator regex"));

const DEFAULT_INVALID_MESSAGE: &str = "Invalid value";

/// Outcome of validating one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }

    /// Message to surface for an invalid result.
    pub fn error_message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_INVALID_MESSAGE)
    }
}

/// Shared validator callback, called on every `set_value`.
pub type Validator<T> = Arc<dyn Fn(&T) -> ValidationResult + Send + Sync>;

/// Wraps a closure as a [`Validator`].
pub fn validator<T, F>(check: F) -> Validator<T>
where
    F: Fn(&T) -> ValidationResult + Send + Sync + 'static,
{
    Arc::new(check)
}

/// Rejects blank (whitespace-only) text.
pub fn required(message: impl Into<String>) -> Validator<String> {
    let message = message.into();
    validator(move |value: &String| {
        if value.trim().is_empty() {
            ValidationResult::invalid(message.clone())
        } else {
            ValidationResult::valid()
        }
    })
}

/// Rejects text longer than `max` characters.
pub fn max_chars(max: usize) -> Validator<String> {
    validator(move |value: &String| {
        if value.chars().count() > max {
            ValidationResult::invalid(format!("Must be at most {max} characters"))
        } else {
            ValidationResult::valid()
        }
    })
}

pub fn email() -> Validator<String> {
    validator(|value: &String| {
        let trimmed = value.trim();
        if trimmed.is_empty() || EMAIL_RE.is_match(trimmed) {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid("Invalid email address")
        }
    })
}

/// Accepts Indonesian mobile numbers; spaces, dashes, dots and parentheses
/// are ignored.
pub fn phone() -> Validator<String> {
    validator(|value: &String| {
        let compact = PHONE_SEPARATOR_RE.replace_all(value.trim(), "");
        if compact.is_empty() || PHONE_RE.is_match(&compact) {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid("Invalid phone number")
        }
    })
}

/// Runs validators in order and returns the first failure.
pub fn all_of<T: 'static>(validators: Vec<Validator<T>>) -> Validator<T> {
    validator(move |value: &T| {
        validators
            .iter()
            .map(|check| check(value))
            .find(|result| !result.is_valid)
            .unwrap_or_else(ValidationResult::valid)
    })
}
