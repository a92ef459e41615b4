// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the live quiz configuration system.

use livequiz_config::{load_and_validate_str, loader::load_config_from_str, ConfigError};

#[test]
fn valid_toml_deserializes_into_app_config() {
    let toml = r#"
[server]
bind_address = "0.0.0.0"
port = 9100
log_level = "debug"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[engine]
tick_seconds = 2
waiting_idle_seconds = 60
waiting_warning_seconds = 30
paused_idle_seconds = 20
paused_warning_seconds = 10

[auth]
bearer_token = "secret"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.engine.tick_seconds, 2);
    assert_eq!(config.auth.bearer_token.as_deref(), Some("secret"));
}

#[test]
fn unknown_field_in_server_section_is_rejected() {
    let toml = r#"
[server]
bnd_address = "0.0.0.0"
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("bnd_address"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[logging]
level = "debug"
"#;
    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.engine.waiting_idle_seconds, 1800);
    assert_eq!(config.engine.waiting_warning_seconds, 900);
    assert_eq!(config.engine.paused_idle_seconds, 600);
    assert_eq!(config.engine.paused_warning_seconds, 300);
    assert!(config.auth.bearer_token.is_none());
}

#[test]
fn load_and_validate_rejects_empty_database_path() {
    let toml = r#"
[storage]
database_path = ""
"#;
    let errors = load_and_validate_str(toml).expect_err("empty database_path should fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
    ));
}

#[test]
fn load_and_validate_rejects_non_positive_timer_window() {
    let toml = r#"
[engine]
paused_idle_seconds = -1
"#;
    let errors =
        load_and_validate_str(toml).expect_err("non-positive paused_idle_seconds should fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("paused_idle_seconds"))
    ));
}

#[test]
fn load_and_validate_accepts_well_formed_config() {
    let toml = r#"
[server]
bind_address = "0.0.0.0"

[storage]
database_path = "/tmp/livequiz.db"
"#;
    let config = load_and_validate_str(toml).expect("well-formed config should validate");
    assert_eq!(config.server.bind_address, "0.0.0.0");
}
