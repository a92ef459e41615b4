// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Storage Repository contract (C1) the session engine depends on.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::{
    AnswerPayload, InteractiveId, InteractiveMeta, LeaderboardEntry, ParticipantId, Question,
    QuestionId, SelectionPercentage, TextMatchPercentage, UserId,
};

/// Everything the Session Engine needs from persistence.
///
/// Implementations must initialize and own their own connection lifecycle;
/// this trait only covers the read/write surface the engine calls during a
/// Session's lifetime. See `livequiz-storage::SqliteRepository` for the
/// SQLite-backed implementation.
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// Loads immutable interactive metadata. Called once per Session construction.
    async fn load_interactive_meta(
        &self,
        id: InteractiveId,
    ) -> Result<InteractiveMeta, EngineError>;

    /// Loads the ordered list of questions (with their answers) for an interactive.
    /// Called once per Session construction.
    async fn load_questions(&self, id: InteractiveId) -> Result<Vec<Question>, EngineError>;

    async fn exists_interactive(&self, id: InteractiveId) -> Result<bool, EngineError>;

    async fn is_conducted(&self, id: InteractiveId) -> Result<bool, EngineError>;

    /// Resolves an externally-authenticated user id to an internal user id,
    /// if a mapping exists. The external id namespace (chat bot account,
    /// SSO subject, etc.) is opaque to the core.
    async fn user_id_by_external(&self, external_id: &str) -> Result<Option<UserId>, EngineError>;

    async fn is_creator(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<bool, EngineError>;

    /// Registers `user_id` as a Participant of `interactive_id`. Idempotent:
    /// calling this for an already-registered user returns the existing id.
    async fn register_participant(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<ParticipantId, EngineError>;

    async fn is_participant_registered(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<bool, EngineError>;

    /// Upserts a participant's answer to a question. Unique on
    /// (participant_id, question_id): a resubmit overwrites the prior row.
    async fn upsert_user_answer(
        &self,
        participant_id: ParticipantId,
        question_id: QuestionId,
        payload: &AnswerPayload,
        is_correct: bool,
        time_seconds: i64,
    ) -> Result<(), EngineError>;

    /// Per-choice selection percentages for a SINGLE/MULTI question, over
    /// participants who submitted an answer to it.
    async fn selection_percentages(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<SelectionPercentage>, EngineError>;

    /// Per-accepted-variant match percentages for a TEXT question.
    async fn text_match_percentages(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<TextMatchPercentage>, EngineError>;

    async fn user_score(
        &self,
        user_id: UserId,
        interactive_id: InteractiveId,
    ) -> Result<i64, EngineError>;

    /// Ordered leaderboard: score descending, then total_time ascending.
    async fn leaderboard(
        &self,
        interactive_id: InteractiveId,
    ) -> Result<Vec<LeaderboardEntry>, EngineError>;

    async fn participant_count(&self, interactive_id: InteractiveId) -> Result<i64, EngineError>;

    async fn mark_conducted(
        &self,
        interactive_id: InteractiveId,
        completed_at: &str,
    ) -> Result<(), EngineError>;

    /// Removes a participant and their UserAnswers from an interactive.
    /// Used by `force_delete` and by the Connection Registry's `detach_all`.
    async fn drop_participant(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<(), EngineError>;

    /// Records the aggregate seconds participants spent on one QUESTION phase.
    async fn record_question_time(
        &self,
        interactive_id: InteractiveId,
        question_id: QuestionId,
        seconds: i64,
    ) -> Result<(), EngineError>;

    /// Adds `seconds` to a participant's `total_time`. The single write site
    /// for that field: called on disconnect and at END.
    async fn accumulate_participant_time(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
        seconds: i64,
    ) -> Result<(), EngineError>;
}
