// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UserAnswer upsert.

use livequiz_core::{AnswerPayload, EngineError, ParticipantId, QuestionId};
use rusqlite::params;

use crate::database::Database;
use crate::queries::questions::question_type_as_str;

/// Upserts a participant's answer to a question. Unique on
/// (participant_id, question_id): a resubmit overwrites the prior row.
pub async fn upsert_user_answer(
    db: &Database,
    participant_id: ParticipantId,
    question_id: QuestionId,
    payload: &AnswerPayload,
    is_correct: bool,
    time_seconds: i64,
) -> Result<(), EngineError> {
    let (kind, answer_id, answer_ids, raw_text, matched_answer_id) = match payload {
        AnswerPayload::Single { answer_id } => (
            question_type_as_str(livequiz_core::QuestionType::Single),
            Some(answer_id.0),
            None,
            None,
            None,
        ),
        AnswerPayload::Multi { answer_ids } => {
            let mut ids: Vec<i64> = answer_ids.iter().map(|a| a.0).collect();
            ids.sort_unstable();
            (
                question_type_as_str(livequiz_core::QuestionType::Multi),
                None,
                Some(serde_json::to_string(&ids).expect("vec of i64 always serializes")),
                None,
                None,
            )
        }
        AnswerPayload::Text {
            raw_text,
            matched_answer_id,
        } => (
            question_type_as_str(livequiz_core::QuestionType::Text),
            None,
            None,
            Some(raw_text.clone()),
            matched_answer_id.map(|a| a.0),
        ),
    };

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_answers
                    (participant_id, question_id, payload_kind, answer_id, answer_ids, raw_text, matched_answer_id, is_correct, time_seconds, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT (participant_id, question_id) DO UPDATE SET
                    payload_kind = excluded.payload_kind,
                    answer_id = excluded.answer_id,
                    answer_ids = excluded.answer_ids,
                    raw_text = excluded.raw_text,
                    matched_answer_id = excluded.matched_answer_id,
                    is_correct = excluded.is_correct,
                    time_seconds = excluded.time_seconds,
                    created_at = excluded.created_at",
                params![
                    participant_id.0,
                    question_id.0,
                    kind,
                    answer_id,
                    answer_ids,
                    raw_text,
                    matched_answer_id,
                    is_correct,
                    time_seconds,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::queries::participants::register_participant;
    use livequiz_core::{AnswerId, InteractiveId, UserId};
    use std::collections::HashSet;

    async fn seed(db: &Database) -> (ParticipantId, QuestionId) {
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO users (id, external_id, username) VALUES (1, 'e1', 'alice')",
                    [],
                )?;
                conn.execute(
                    "INSERT INTO interactives (id, code, title, description, countdown_duration, answer_duration, discussion_duration, created_by)
                     VALUES (1, 'C1', 't', 'd', 5, 20, 10, 1)",
                    [],
                )?;
                conn.execute(
                    "INSERT INTO questions (id, interactive_id, position, text, score, question_type)
                     VALUES (1, 1, 1, 'q1', 2, 'multi')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();
        let participant_id = register_participant(db, InteractiveId(1), UserId(1)).await.unwrap();
        (participant_id, QuestionId(1))
    }

    #[tokio::test]
    async fn resubmit_overwrites_prior_row() {
        let db = Database::open_in_memory().await.unwrap();
        let (participant_id, question_id) = seed(&db).await;

        let first = AnswerPayload::Multi {
            answer_ids: HashSet::from([AnswerId(1)]),
        };
        upsert_user_answer(&db, participant_id, question_id, &first, false, 3)
            .await
            .unwrap();

        let second = AnswerPayload::Multi {
            answer_ids: HashSet::from([AnswerId(1), AnswerId(2)]),
        };
        upsert_user_answer(&db, participant_id, question_id, &second, true, 9)
            .await
            .unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM user_answers", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1, "resubmit must overwrite, not duplicate");
    }
}
