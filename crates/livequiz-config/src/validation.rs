// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid IP addresses, non-empty paths, and positive
//! timer windows.

use crate::error::ConfigError;
use crate::model::AppConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let addr = config.server.bind_address.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.engine.tick_seconds == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.tick_seconds must be at least 1".to_string(),
        });
    }

    for (field, value) in [
        ("engine.waiting_idle_seconds", config.engine.waiting_idle_seconds),
        (
            "engine.waiting_warning_seconds",
            config.engine.waiting_warning_seconds,
        ),
        ("engine.paused_idle_seconds", config.engine.paused_idle_seconds),
        (
            "engine.paused_warning_seconds",
            config.engine.paused_warning_seconds,
        ),
    ] {
        if value <= 0 {
            errors.push(ConfigError::Validation {
                message: format!("{field} must be positive, got {value}"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
