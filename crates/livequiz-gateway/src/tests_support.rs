// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the gateway's own unit tests.

use async_trait::async_trait;

use livequiz_core::{
    AnswerPayload, EngineError, InteractiveId, InteractiveMeta, LeaderboardEntry, ParticipantId,
    Question, QuestionId, SelectionPercentage, StorageRepository, TextMatchPercentage, UserId,
};

/// A storage double with no questions and a single known user/creator,
/// useful for exercising the gateway's upgrade-rejection branches without a
/// real SQLite database.
pub struct EmptyStorage;

#[async_trait]
impl StorageRepository for EmptyStorage {
    async fn load_interactive_meta(&self, id: InteractiveId) -> Result<InteractiveMeta, EngineError> {
        Ok(InteractiveMeta {
            id,
            code: "X".into(),
            title: "t".into(),
            description: "d".into(),
            countdown_duration: 1,
            answer_duration: 1,
            discussion_duration: 1,
        })
    }
    async fn load_questions(&self, _id: InteractiveId) -> Result<Vec<Question>, EngineError> {
        Ok(vec![])
    }
    async fn exists_interactive(&self, _id: InteractiveId) -> Result<bool, EngineError> {
        Ok(true)
    }
    async fn is_conducted(&self, _id: InteractiveId) -> Result<bool, EngineError> {
        Ok(false)
    }
    async fn user_id_by_external(&self, external_id: &str) -> Result<Option<UserId>, EngineError> {
        match external_id {
            "alice" => Ok(Some(UserId(1))),
            "bob" => Ok(Some(UserId(2))),
            _ => Ok(None),
        }
    }
    async fn is_creator(&self, _interactive_id: InteractiveId, user_id: UserId) -> Result<bool, EngineError> {
        Ok(user_id == UserId(1))
    }
    async fn register_participant(&self, _interactive_id: InteractiveId, _user_id: UserId) -> Result<ParticipantId, EngineError> {
        Ok(ParticipantId(1))
    }
    async fn is_participant_registered(&self, _interactive_id: InteractiveId, _user_id: UserId) -> Result<bool, EngineError> {
        Ok(true)
    }
    async fn upsert_user_answer(&self, _participant_id: ParticipantId, _question_id: QuestionId, _payload: &AnswerPayload, _is_correct: bool, _time_seconds: i64) -> Result<(), EngineError> {
        Ok(())
    }
    async fn selection_percentages(&self, _question_id: QuestionId) -> Result<Vec<SelectionPercentage>, EngineError> {
        Ok(vec![])
    }
    async fn text_match_percentages(&self, _question_id: QuestionId) -> Result<Vec<TextMatchPercentage>, EngineError> {
        Ok(vec![])
    }
    async fn user_score(&self, _user_id: UserId, _interactive_id: InteractiveId) -> Result<i64, EngineError> {
        Ok(0)
    }
    async fn leaderboard(&self, _interactive_id: InteractiveId) -> Result<Vec<LeaderboardEntry>, EngineError> {
        Ok(vec![])
    }
    async fn participant_count(&self, _interactive_id: InteractiveId) -> Result<i64, EngineError> {
        Ok(0)
    }
    async fn mark_conducted(&self, _interactive_id: InteractiveId, _completed_at: &str) -> Result<(), EngineError> {
        Ok(())
    }
    async fn drop_participant(&self, _interactive_id: InteractiveId, _user_id: UserId) -> Result<(), EngineError> {
        Ok(())
    }
    async fn record_question_time(&self, _interactive_id: InteractiveId, _question_id: QuestionId, _seconds: i64) -> Result<(), EngineError> {
        Ok(())
    }
    async fn accumulate_participant_time(&self, _interactive_id: InteractiveId, _user_id: UserId, _seconds: i64) -> Result<(), EngineError> {
        Ok(())
    }
}
