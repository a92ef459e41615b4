// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the live quiz session engine.
//!
//! This crate provides the domain types, error model, wire contract, and the
//! [`StorageRepository`] trait the engine depends on. It has no async runtime
//! dependency of its own beyond `async-trait`.

pub mod error;
pub mod traits;
pub mod types;
pub mod wire;

pub use error::EngineError;
pub use traits::StorageRepository;
pub use types::{
    AnswerId, AnswerPayload, EndReason, IdleState, InteractiveId, InteractiveMeta,
    LeaderboardEntry, Participant, ParticipantId, Phase, Question, QuestionId, QuestionType,
    Role, SelectionPercentage, TextMatchPercentage, UserAnswer, UserId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_and_phase_are_reexported() {
        let _e = EngineError::Internal("test".into());
        let _p = Phase::Waiting;
    }
}
