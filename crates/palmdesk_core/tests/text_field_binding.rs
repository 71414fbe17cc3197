mod common;

use common::{advance, memory_store, RecordingGateway};
use palmdesk_core::autosave::validation::required;
use palmdesk_core::{
    AutosaveOptions, AutosaveTextField, FieldKind, StatusIcon, TextFieldProps,
    DEFAULT_SETTLE_WINDOW, SIMULATED_NETWORK_ERROR,
};
use serde_json::json;
use std::time::Duration;

fn phone_options() -> AutosaveOptions<String> {
    AutosaveOptions::new("supplier-1", "phone", String::new())
}

#[tokio::test(start_paused = true)]
async fn typing_then_blur_saves_the_final_value_once() {
    let store = memory_store();
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options(),
        store.clone(),
        gateway.clone(),
    );

    field.on_focus();
    field.on_input("08123");
    advance(20).await;
    field.on_input("0812345");
    field.on_blur();
    advance(2_000).await;

    assert_eq!(gateway.saved_values(), vec![json!("0812345")]);
    let status = field.status();
    assert_eq!(status.last_saved_value.as_deref(), Some("0812345"));
    assert!(!status.is_dirty);
    assert_eq!(store.get_value("supplier-1", "phone"), Some(json!("0812345")));
}

#[tokio::test(start_paused = true)]
async fn failed_save_still_lands_in_durable_store() {
    let store = memory_store();
    let gateway = RecordingGateway::failing();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options(),
        store.clone(),
        gateway,
    );

    field.on_input("08123");
    advance(20).await;
    field.on_input("0812345");
    field.on_blur();
    advance(1_000).await;

    let status = field.status();
    assert!(status.has_error);
    assert_eq!(status.error_message.as_deref(), Some(SIMULATED_NETWORK_ERROR));
    assert_eq!(
        store.get_typed::<String>("supplier-1", "phone").as_deref(),
        Some("0812345")
    );
}

#[tokio::test(start_paused = true)]
async fn zero_delay_field_saves_once_typing_settles() {
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options(),
        memory_store(),
        gateway.clone(),
    );

    for raw in ["0", "08", "081", "0812"] {
        field.on_input(raw);
        advance(150).await;
    }
    assert!(gateway.calls().is_empty());

    advance(DEFAULT_SETTLE_WINDOW.as_millis() as u64).await;
    assert_eq!(gateway.saved_values(), vec![json!("0812")]);
}

#[tokio::test(start_paused = true)]
async fn blur_during_in_flight_save_of_same_value_does_not_resubmit() {
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone").with_settle_window(Duration::from_millis(100)),
        phone_options(),
        memory_store(),
        gateway.clone(),
    );

    field.on_input("0812345");
    advance(150).await;
    assert!(field.status().is_saving);

    field.on_blur();
    advance(1_000).await;

    assert_eq!(gateway.saved_values(), vec![json!("0812345")]);
    let status = field.status();
    assert!(status.is_saved);
    assert_eq!(status.last_saved_value.as_deref(), Some("0812345"));
}

#[tokio::test(start_paused = true)]
async fn blur_during_in_flight_save_of_older_value_submits_latest() {
    let store = memory_store();
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone").with_settle_window(Duration::from_millis(100)),
        phone_options(),
        store.clone(),
        gateway.clone(),
    );

    field.on_input("08123");
    advance(150).await;
    assert!(field.status().is_saving);

    field.on_input("0812345");
    field.on_blur();
    advance(1_000).await;

    assert_eq!(gateway.saved_values(), vec![json!("08123"), json!("0812345")]);
    assert_eq!(field.status().last_saved_value.as_deref(), Some("0812345"));
    assert_eq!(store.get_value("supplier-1", "phone"), Some(json!("0812345")));
}

#[tokio::test(start_paused = true)]
async fn blur_forces_immediate_save_despite_long_debounce() {
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options().with_delay(Duration::from_secs(30)),
        memory_store(),
        gateway.clone(),
    );

    field.on_input("0812");
    advance(100).await;
    assert!(gateway.calls().is_empty());

    field.on_blur();
    advance(1_000).await;
    assert_eq!(gateway.saved_values(), vec![json!("0812")]);
}

#[tokio::test(start_paused = true)]
async fn blur_without_changes_does_not_resave() {
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options(),
        memory_store(),
        gateway.clone(),
    );

    field.on_input("0812");
    advance(1_000).await;
    field.on_blur();
    advance(1_000).await;

    assert_eq!(gateway.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn focus_clears_stale_error() {
    let gateway = RecordingGateway::failing();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone").with_status_display(true, true),
        phone_options(),
        memory_store(),
        gateway,
    );

    field.on_input("0812");
    advance(1_000).await;
    assert_eq!(
        field.view().status_text.map(|indicator| indicator.icon),
        Some(StatusIcon::Error)
    );

    field.on_focus();
    let view = field.view();
    assert!(view.focused);
    assert_eq!(view.inline_status, None);
    assert_eq!(view.status_text, None);
    assert_eq!(view.value, "0812");
}

#[tokio::test(start_paused = true)]
async fn status_displays_are_toggled_independently() {
    let gateway = RecordingGateway::new();
    let mut inline_only = AutosaveTextField::mount(
        TextFieldProps::text("Name"),
        AutosaveOptions::new("supplier-1", "name", String::new())
            .with_delay(Duration::from_secs(5)),
        memory_store(),
        gateway.clone(),
    );
    let mut below_only = AutosaveTextField::mount(
        TextFieldProps::text_area("Notes", 4).with_status_display(false, true),
        AutosaveOptions::new("supplier-1", "notes", String::new())
            .with_delay(Duration::from_secs(5)),
        memory_store(),
        gateway,
    );

    inline_only.on_input("PT Sawit");
    below_only.on_input("Kebun Riau");

    let inline_view = inline_only.view();
    assert_eq!(
        inline_view.inline_status.map(|indicator| indicator.icon),
        Some(StatusIcon::Pencil)
    );
    assert_eq!(inline_view.status_text, None);

    let below_view = below_only.view();
    assert_eq!(below_view.inline_status, None);
    assert_eq!(
        below_view.status_text.map(|indicator| indicator.text),
        Some("Unsaved changes".to_string())
    );
    assert_eq!(below_view.kind, FieldKind::MultiLine { rows: 4 });
}

#[tokio::test(start_paused = true)]
async fn validation_error_shows_below_field() {
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Supplier name")
            .required()
            .with_status_display(false, true),
        AutosaveOptions::new("supplier-1", "name", "PT Sawit".to_string())
            .with_validator(required("Supplier name is required")),
        memory_store(),
        gateway.clone(),
    );

    field.on_input("  ");
    advance(1_000).await;

    let view = field.view();
    assert!(view.required);
    assert_eq!(
        view.status_text.map(|indicator| indicator.text),
        Some("Supplier name is required".to_string())
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disabled_field_ignores_input() {
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Code").disabled(),
        AutosaveOptions::new("supplier-1", "code", "SUP-001".to_string()),
        memory_store(),
        gateway.clone(),
    );

    field.on_input("changed");
    field.on_blur();
    advance(1_000).await;

    assert_eq!(field.raw_input(), "SUP-001");
    assert!(gateway.calls().is_empty());
    assert!(field.status().is_idle());
}

#[tokio::test(start_paused = true)]
async fn unmount_drops_pending_save() {
    let store = memory_store();
    let gateway = RecordingGateway::new();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options().with_delay(Duration::from_secs(2)),
        store.clone(),
        gateway.clone(),
    );

    field.on_input("0812");
    field.unmount();
    advance(5_000).await;

    assert!(gateway.calls().is_empty());
    assert_eq!(store.get_value("supplier-1", "phone"), None);
}

#[tokio::test(start_paused = true)]
async fn remount_restores_draft_from_store() {
    let store = memory_store();
    let gateway = RecordingGateway::failing();
    let mut field = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options(),
        store.clone(),
        gateway.clone(),
    );
    field.on_input("0812345");
    advance(1_000).await;
    field.unmount();

    let restored = AutosaveTextField::mount(
        TextFieldProps::text("Phone"),
        phone_options(),
        store,
        gateway,
    );
    assert_eq!(restored.raw_input(), "0812345");
    assert_eq!(restored.view().value, "0812345");
}
