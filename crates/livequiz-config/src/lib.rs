// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the live quiz session engine.
//!
//! Config is assembled with Figment: compiled defaults, `/etc`, XDG user
//! config, a local file, then `LIVEQUIZ_*` env vars, in that order. Semantic
//! checks that serde attributes can't express (valid bind address, positive
//! timer windows) run afterwards via [`validation::validate_config`].

pub mod error;
pub mod loader;
pub mod model;
pub mod validation;

pub use error::ConfigError;
pub use model::AppConfig;

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<AppConfig, Vec<ConfigError>> {
    let config = loader::load_config().map_err(|e| vec![ConfigError::Load(e)])?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it. Used by tests and
/// by callers that already have config content in hand.
pub fn load_and_validate_str(toml_content: &str) -> Result<AppConfig, Vec<ConfigError>> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| vec![ConfigError::Load(e)])?;
    validation::validate_config(&config)?;
    Ok(config)
}
