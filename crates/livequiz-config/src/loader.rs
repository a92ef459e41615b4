// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order, later overrides earlier: compiled defaults, then
//! `/etc/livequiz/livequiz.toml`, then `~/.config/livequiz/livequiz.toml`,
//! then `./livequiz.toml`, then `LIVEQUIZ_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AppConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<AppConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env merge).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AppConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AppConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file("/etc/livequiz/livequiz.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("livequiz/livequiz.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("livequiz.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names, e.g. `LIVEQUIZ_SERVER_BIND_ADDRESS` must
/// map to `server.bind_address`, not `server.bind.address`.
fn env_provider() -> Env {
    Env::prefixed("LIVEQUIZ_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("engine_", "engine.", 1)
            .replacen("auth_", "auth.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }

    #[test]
    fn toml_overrides_defaults() {
        let toml = r#"
[server]
bind_address = "0.0.0.0"
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn env_var_overrides_bind_address() {
        use figment::providers::Serialized;

        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(("server.bind_address", "10.0.0.1"))
            .extract()
            .unwrap();
        assert_eq!(config.server.bind_address, "10.0.0.1");
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let toml = r#"
[bogus]
x = 1
"#;
        let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
        assert!(format!("{err}").contains("unknown field") || format!("{err}").contains("bogus"));
    }
}
