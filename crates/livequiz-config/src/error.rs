// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error types.

use thiserror::Error;

/// A configuration problem, either from Figment/serde deserialization or
/// from post-deserialization semantic validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("{message}")]
    Validation { message: String },
}
