//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire storage, store, gateway and one bound field end to end.
//! - Print the settled status so core wiring can be checked without a UI.

use clap::Parser;
use palmdesk_core::autosave::validation::{all_of, phone, required};
use palmdesk_core::{
    indicator_for, AutosaveOptions, AutosaveSettings, AutosaveTextField, DurableFieldStore,
    FieldStatus, KeyValueStorage, SqliteKeyValueStorage, TextFieldProps,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const FORM_ID: &str = "supplier-1";
const FIELD_NAME: &str = "phone";
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "palmdesk_cli")]
#[command(about = "Runs one autosaved supplier field end to end")]
#[command(version)]
struct Args {
    #[arg(long)]
    #[arg(help = "SQLite storage file; an in-memory database when omitted")]
    db: Option<PathBuf>,

    #[arg(long)]
    #[arg(help = "Autosave settings JSON file")]
    settings: Option<PathBuf>,

    #[arg(long, env = "PALMDESK_LOG_DIR")]
    #[arg(help = "Absolute directory for log files; logging is off when omitted")]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => match AutosaveSettings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("palmdesk_cli: {err}");
                return ExitCode::from(2);
            }
        },
        None => AutosaveSettings::default(),
    };

    if let Some(log_dir) = &args.log_dir {
        let level = settings
            .log_level
            .clone()
            .unwrap_or_else(|| palmdesk_core::default_log_level().to_string());
        if let Err(err) = palmdesk_core::init_logging(&level, log_dir) {
            eprintln!("palmdesk_cli: logging disabled: {err}");
        }
    }

    let storage = match &args.db {
        Some(path) => SqliteKeyValueStorage::open(path),
        None => SqliteKeyValueStorage::open_in_memory(),
    };
    let storage: Arc<dyn KeyValueStorage> = match storage {
        Ok(storage) => Arc::new(storage),
        Err(err) => {
            eprintln!("palmdesk_cli: failed to open storage: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("palmdesk_core ping={}", palmdesk_core::ping());
    println!("palmdesk_core version={}", palmdesk_core::core_version());

    let store = Arc::new(DurableFieldStore::with_namespace(
        storage,
        settings.storage_key.clone(),
    ));
    let gateway = Arc::new(settings.simulated_gateway());

    let options = settings.apply(
        AutosaveOptions::new(FORM_ID, FIELD_NAME, String::new()).with_validator(all_of(vec![
            required("Phone number is required"),
            phone(),
        ])),
    );
    let props = TextFieldProps::text("Phone")
        .with_placeholder("08xx-xxxx-xxxx")
        .required()
        .with_status_display(true, true);
    let mut field = AutosaveTextField::mount(props, options, store.clone(), gateway);
    println!(
        "field={FORM_ID}.{FIELD_NAME} seed={:?} value={:?}",
        field.controller().seed_source(),
        field.raw_input()
    );

    let mut updates = field.controller().subscribe();
    field.on_focus();
    field.on_input("0812");
    field.on_input("0812-3456-7890");
    field.on_blur();

    let settled = tokio::time::timeout(SETTLE_TIMEOUT, async {
        loop {
            if is_settled(&updates.borrow_and_update()) {
                return;
            }
            if updates.changed().await.is_err() {
                return;
            }
        }
    })
    .await;
    if settled.is_err() {
        eprintln!("palmdesk_cli: save did not settle within {SETTLE_TIMEOUT:?}");
    }

    let status = field.status();
    let indicator = indicator_for(&status);
    println!(
        "status icon={:?} color={} text={:?}",
        indicator.icon,
        indicator.color.css_class(),
        indicator.text
    );
    println!(
        "durable value={}",
        store
            .get_value(FORM_ID, FIELD_NAME)
            .map_or_else(|| "<none>".to_string(), |value| value.to_string())
    );

    field.unmount();
    if status.has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn is_settled(status: &FieldStatus<String>) -> bool {
    !status.is_saving && (status.has_error || !status.is_dirty)
}
