// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the live quiz session engine.

use thiserror::Error;

/// The primary error type used across the session engine, storage, and gateway crates.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed inbound frame, out-of-phase submission, or bad answer ids.
    ///
    /// Ingest drops these silently per the design; this variant exists for
    /// call sites (e.g. the upgrade handler) that must still report them.
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-creator attempting a LEADER upgrade, or a non-registered PARTICIPANT
    /// reconnecting mid-session.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// The interactive id is unknown, or already conducted.
    #[error("not found: {0}")]
    NotFound(String),

    /// A storage operation failed.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Sending a payload to a transport failed; always treated as a disconnect.
    #[error("transport error: {0}")]
    Transport(String),

    /// An invariant the state machine depends on was violated (e.g. a phase was
    /// reached without a preloaded question). The session must abort to END
    /// without marking the interactive conducted.
    #[error("fatal invariant violation: {0}")]
    FatalInvariant(String),

    /// Configuration was missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        EngineError::Storage {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_has_all_variants() {
        let _validation = EngineError::Validation("bad frame".into());
        let _auth = EngineError::Authorization("not creator".into());
        let _not_found = EngineError::NotFound("interactive 1".into());
        let _storage = EngineError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        let _transport = EngineError::Transport("send failed".into());
        let _fatal = EngineError::FatalInvariant("question missing".into());
        let _config = EngineError::Config("bad toml".into());
        let _internal = EngineError::Internal("unreachable".into());
    }

    #[test]
    fn display_messages_are_human_readable() {
        let e = EngineError::NotFound("interactive 42".into());
        assert_eq!(e.to_string(), "not found: interactive 42");
    }
}
