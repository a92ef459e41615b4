// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `StorageRepository` trait.

use async_trait::async_trait;

use livequiz_core::{
    AnswerPayload, EngineError, InteractiveId, InteractiveMeta, LeaderboardEntry, ParticipantId,
    Question, QuestionId, SelectionPercentage, StorageRepository, TextMatchPercentage, UserId,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed repository. Opens and migrates its own [`Database`] handle.
pub struct SqliteRepository {
    db: Database,
}

impl SqliteRepository {
    /// Opens (creating if absent) the database at `path`, running migrations.
    pub async fn open(path: &str) -> Result<Self, EngineError> {
        let db = Database::open(path).await?;
        Ok(Self { db })
    }

    /// Checkpoints the WAL and releases the connection. Call during graceful
    /// shutdown, after all Sessions have drained.
    pub async fn close(self) -> Result<(), EngineError> {
        self.db.close().await
    }
}

#[async_trait]
impl StorageRepository for SqliteRepository {
    async fn load_interactive_meta(
        &self,
        id: InteractiveId,
    ) -> Result<InteractiveMeta, EngineError> {
        queries::interactives::load_interactive_meta(&self.db, id).await
    }

    async fn load_questions(&self, id: InteractiveId) -> Result<Vec<Question>, EngineError> {
        queries::questions::load_questions(&self.db, id).await
    }

    async fn exists_interactive(&self, id: InteractiveId) -> Result<bool, EngineError> {
        queries::interactives::exists_interactive(&self.db, id).await
    }

    async fn is_conducted(&self, id: InteractiveId) -> Result<bool, EngineError> {
        queries::interactives::is_conducted(&self.db, id).await
    }

    async fn user_id_by_external(&self, external_id: &str) -> Result<Option<UserId>, EngineError> {
        queries::users::user_id_by_external(&self.db, external_id).await
    }

    async fn is_creator(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<bool, EngineError> {
        queries::interactives::is_creator(&self.db, interactive_id, user_id).await
    }

    async fn register_participant(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<ParticipantId, EngineError> {
        queries::participants::register_participant(&self.db, interactive_id, user_id).await
    }

    async fn is_participant_registered(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<bool, EngineError> {
        queries::participants::is_participant_registered(&self.db, interactive_id, user_id).await
    }

    async fn upsert_user_answer(
        &self,
        participant_id: ParticipantId,
        question_id: QuestionId,
        payload: &AnswerPayload,
        is_correct: bool,
        time_seconds: i64,
    ) -> Result<(), EngineError> {
        queries::answers::upsert_user_answer(
            &self.db,
            participant_id,
            question_id,
            payload,
            is_correct,
            time_seconds,
        )
        .await
    }

    async fn selection_percentages(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<SelectionPercentage>, EngineError> {
        queries::questions::selection_percentages(&self.db, question_id).await
    }

    async fn text_match_percentages(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<TextMatchPercentage>, EngineError> {
        queries::questions::text_match_percentages(&self.db, question_id).await
    }

    async fn user_score(
        &self,
        user_id: UserId,
        interactive_id: InteractiveId,
    ) -> Result<i64, EngineError> {
        queries::participants::user_score(&self.db, user_id, interactive_id).await
    }

    async fn leaderboard(
        &self,
        interactive_id: InteractiveId,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        queries::participants::leaderboard(&self.db, interactive_id).await
    }

    async fn participant_count(&self, interactive_id: InteractiveId) -> Result<i64, EngineError> {
        queries::participants::participant_count(&self.db, interactive_id).await
    }

    async fn mark_conducted(
        &self,
        interactive_id: InteractiveId,
        completed_at: &str,
    ) -> Result<(), EngineError> {
        queries::interactives::mark_conducted(&self.db, interactive_id, completed_at).await
    }

    async fn drop_participant(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
    ) -> Result<(), EngineError> {
        queries::participants::drop_participant(&self.db, interactive_id, user_id).await
    }

    async fn record_question_time(
        &self,
        _interactive_id: InteractiveId,
        question_id: QuestionId,
        seconds: i64,
    ) -> Result<(), EngineError> {
        queries::interactives::record_question_time(&self.db, question_id, seconds).await
    }

    async fn accumulate_participant_time(
        &self,
        interactive_id: InteractiveId,
        user_id: UserId,
        seconds: i64,
    ) -> Result<(), EngineError> {
        queries::participants::accumulate_participant_time(
            &self.db,
            interactive_id,
            user_id,
            seconds,
        )
        .await
    }
}
