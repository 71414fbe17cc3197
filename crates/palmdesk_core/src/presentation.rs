//! Status indicator mapping.
//!
//! # Responsibility
//! - Map a [`FieldStatus`] snapshot to icon, text and color for rendering.
//!
//! # Invariants
//! - Pure: the same status always yields the same indicator.
//! - Priority is saving > error > saved > dirty > neutral.

use crate::model::status::FieldStatus;
use serde::Serialize;

pub const SAVING_TEXT: &str = "Saving...";
pub const SAVED_TEXT: &str = "Saved";
pub const DIRTY_TEXT: &str = "Unsaved changes";
pub const FALLBACK_ERROR_TEXT: &str = "Save failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    Spinner,
    Error,
    Check,
    Pencil,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Info,
    Danger,
    Success,
    Warning,
    Muted,
}

impl StatusColor {
    /// Stable CSS class for the host stylesheet.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Info => "text-blue-500",
            Self::Danger => "text-red-500",
            Self::Success => "text-green-500",
            Self::Warning => "text-amber-500",
            Self::Muted => "text-gray-400",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusIndicator {
    pub icon: StatusIcon,
    pub text: String,
    pub color: StatusColor,
}

impl StatusIndicator {
    /// Neutral indicators render nothing.
    pub fn is_neutral(&self) -> bool {
        self.icon == StatusIcon::None
    }
}

pub fn indicator_for<T>(status: &FieldStatus<T>) -> StatusIndicator {
    let (icon, text, color) = if status.is_saving {
        (StatusIcon::Spinner, SAVING_TEXT.to_string(), StatusColor::Info)
    } else if status.has_error {
        let text = status
            .error_message
            .clone()
            .unwrap_or_else(|| FALLBACK_ERROR_TEXT.to_string());
        (StatusIcon::Error, text, StatusColor::Danger)
    } else if status.is_saved {
        (StatusIcon::Check, SAVED_TEXT.to_string(), StatusColor::Success)
    } else if status.is_dirty {
        (StatusIcon::Pencil, DIRTY_TEXT.to_string(), StatusColor::Warning)
    } else {
        (StatusIcon::None, String::new(), StatusColor::Muted)
    };

    StatusIndicator { icon, text, color }
}
