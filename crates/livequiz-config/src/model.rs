// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the live quiz session engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Gateway bind address and CORS settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session tick-loop tuning.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Gateway bearer-token auth.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the WebSocket/HTTP gateway binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the gateway listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level passed to `EnvFilter` when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "livequiz.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Session tick-loop tuning. Defaults mirror the literal constants from the
/// timer semantics: WAITING idle 30min/15min, paused idle 10min/5min.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Seconds between broadcast ticks while a Session is not terminated.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    /// Initial WAITING idle window, in seconds, before the first warning.
    #[serde(default = "default_waiting_idle_seconds")]
    pub waiting_idle_seconds: i64,

    /// WAITING warning window, in seconds, before the Session is destroyed.
    #[serde(default = "default_waiting_warning_seconds")]
    pub waiting_warning_seconds: i64,

    /// Initial paused-idle window, in seconds, before the first warning.
    #[serde(default = "default_paused_idle_seconds")]
    pub paused_idle_seconds: i64,

    /// Paused-idle warning window, in seconds, before the Session force-ends.
    #[serde(default = "default_paused_warning_seconds")]
    pub paused_warning_seconds: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            waiting_idle_seconds: default_waiting_idle_seconds(),
            waiting_warning_seconds: default_waiting_warning_seconds(),
            paused_idle_seconds: default_paused_idle_seconds(),
            paused_warning_seconds: default_paused_warning_seconds(),
        }
    }
}

fn default_tick_seconds() -> u64 {
    1
}

fn default_waiting_idle_seconds() -> i64 {
    30 * 60
}

fn default_waiting_warning_seconds() -> i64 {
    15 * 60
}

fn default_paused_idle_seconds() -> i64 {
    10 * 60
}

fn default_paused_warning_seconds() -> i64 {
    5 * 60
}

/// Gateway authentication configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Static bearer token required on admin/organizer REST and WS routes.
    /// `None` disables bearer-token auth entirely (upgrade rejection rules
    /// from the wire contract still apply independently).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { bearer_token: None }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
