//! Loading runtime configuration and client settings from TOML files

use pushlink_core::{
    settings::{ATTACHMENT_DIR, INCOGNITO, SAVE_ATTACHMENTS},
    ClientSettings, ConfigError, PushlinkConfig, Settings, SharedSettings,
};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_file() {
    let file = write_file(
        r#"
        [supervisor]
        reconnect_delay_ms = 1500
        shutdown_timeout_ms = 2000

        [receipts]
        max_retries = 5
        retry_delay_ms = 250

        [channels]
        inbound_buffer_size = 32
        app_event_buffer_size = 16
        receipt_queue_size = 8

        [dispatch]
        dedicated_receipt_worker = true
        "#,
    );

    let config = PushlinkConfig::load_from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.supervisor.reconnect_delay(), Duration::from_millis(1500));
    assert_eq!(config.supervisor.shutdown_timeout(), Duration::from_secs(2));
    assert_eq!(config.receipts.max_attempts(), 6);
    assert_eq!(config.receipts.retry_delay(), Duration::from_millis(250));
    assert_eq!(config.channels.receipt_queue_size, 8);
    assert!(config.dispatch.dedicated_receipt_worker);
}

#[test]
fn test_partial_config_file_keeps_defaults() {
    let file = write_file("[receipts]\nmax_retries = 1\n");

    let config = PushlinkConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.receipts.max_retries, 1);
    assert_eq!(config.receipts.retry_delay(), Duration::from_millis(500));
    assert_eq!(config.supervisor.reconnect_delay(), Duration::from_secs(3));
    assert!(!config.dispatch.dedicated_receipt_worker);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = PushlinkConfig::load_from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_malformed_config_file() {
    let file = write_file("[supervisor]\nreconnect_delay_ms = \"soon\"\n");
    let result = PushlinkConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_settings_file_drives_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&format!(
        "save_attachments = true\nattachment_dir = {:?}\n",
        dir.path().display().to_string()
    ));

    let settings = ClientSettings::load_from_file(file.path()).unwrap();
    assert!(settings.get_bool(SAVE_ATTACHMENTS));
    assert!(!settings.get_bool(INCOGNITO));
    assert_eq!(
        settings.get_string(ATTACHMENT_DIR),
        Some(dir.path().display().to_string())
    );

    let shared = SharedSettings::new(settings);
    let reader = shared.clone();
    shared.update(|settings| settings.incognito = true);
    assert!(reader.get_bool(INCOGNITO));
    assert!(reader.snapshot().save_attachments);
}
