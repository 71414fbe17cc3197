//! Text input and text area binding.
//!
//! # Invariants
//! - Every keystroke is forwarded to the controller. With a zero controller
//!   delay the save waits for typing to settle for the field's settle window.
//! - Blur forces an immediate save attempt when the input differs from both
//!   the last saved value and the value already in flight, independent of
//!   debounce timing.
//! - Focus clears stale saved/error flags.

use crate::autosave::controller::{AutosaveController, AutosaveOptions};
use crate::gateway::SaveGateway;
use crate::model::status::FieldStatus;
use crate::presentation::{indicator_for, StatusIndicator};
use crate::store::field_store::DurableFieldStore;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Quiet period after the last keystroke before a zero-delay field saves.
pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_millis(400);

/// Input surface shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldKind {
    SingleLine,
    MultiLine { rows: u16 },
}

/// Static presentation properties of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFieldProps {
    pub label: String,
    pub placeholder: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
    pub disabled: bool,
    /// Icon next to the input.
    pub show_inline_status: bool,
    /// Text line below the input.
    pub show_status_text: bool,
    /// Minimum debounce for keystrokes.
    pub settle_window: Duration,
}

impl TextFieldProps {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder: None,
            kind: FieldKind::SingleLine,
            required: false,
            disabled: false,
            show_inline_status: true,
            show_status_text: false,
            settle_window: DEFAULT_SETTLE_WINDOW,
        }
    }

    pub fn text_area(label: impl Into<String>, rows: u16) -> Self {
        Self {
            kind: FieldKind::MultiLine { rows },
            ..Self::text(label)
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn with_settle_window(mut self, settle_window: Duration) -> Self {
        self.settle_window = settle_window;
        self
    }

    pub fn with_status_display(mut self, inline: bool, below: bool) -> Self {
        self.show_inline_status = inline;
        self.show_status_text = below;
        self
    }
}

/// Render-ready snapshot of a bound field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub label: String,
    pub placeholder: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
    pub disabled: bool,
    pub focused: bool,
    pub value: String,
    pub inline_status: Option<StatusIndicator>,
    pub status_text: Option<StatusIndicator>,
}

/// One text field bound to its own autosave controller.
pub struct AutosaveTextField {
    props: TextFieldProps,
    controller: AutosaveController<String>,
    raw_input: String,
    focused: bool,
}

impl AutosaveTextField {
    /// Creates the controller for `options` and binds it.
    pub fn mount(
        props: TextFieldProps,
        options: AutosaveOptions<String>,
        store: Arc<DurableFieldStore>,
        gateway: Arc<dyn SaveGateway>,
    ) -> Self {
        Self::bind(props, AutosaveController::new(options, store, gateway))
    }

    pub fn bind(props: TextFieldProps, controller: AutosaveController<String>) -> Self {
        let raw_input = controller.value();
        Self {
            props,
            controller,
            raw_input,
            focused: false,
        }
    }

    pub fn controller(&self) -> &AutosaveController<String> {
        &self.controller
    }

    pub fn props(&self) -> &TextFieldProps {
        &self.props
    }

    pub fn status(&self) -> FieldStatus<String> {
        self.controller.status()
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    /// Keystroke: forwards the whole input text to the controller.
    pub fn on_input(&mut self, raw: impl Into<String>) {
        if self.props.disabled {
            return;
        }
        self.raw_input = raw.into();
        let delay = self.controller.delay().max(self.props.settle_window);
        self.controller
            .set_value_after(self.raw_input.clone(), delay);
    }

    pub fn on_focus(&mut self) {
        self.focused = true;
        self.controller.clear_status();
    }

    pub fn on_blur(&mut self) {
        self.focused = false;
        if self.props.disabled {
            return;
        }
        let raw = Some(self.raw_input.as_str());
        if self.controller.status().last_saved_value.as_deref() == raw
            || self.controller.in_flight_value().as_deref() == raw
        {
            return;
        }
        debug!(
            "event=binding_blur module=binding status=resave field={}",
            self.controller.key()
        );
        self.controller.save_now(self.raw_input.clone());
    }

    pub fn view(&self) -> FieldView {
        let indicator = indicator_for(&self.controller.status());
        let visible = (!indicator.is_neutral()).then_some(indicator);
        FieldView {
            label: self.props.label.clone(),
            placeholder: self.props.placeholder.clone(),
            kind: self.props.kind,
            required: self.props.required,
            disabled: self.props.disabled,
            focused: self.focused,
            value: self.raw_input.clone(),
            inline_status: visible
                .clone()
                .filter(|_| self.props.show_inline_status),
            status_text: visible.filter(|_| self.props.show_status_text),
        }
    }

    /// Disposes the controller; pending debounced saves are dropped.
    pub fn unmount(self) {
        debug!(
            "event=binding_unmount module=binding status=ok field={}",
            self.controller.key()
        );
    }
}
