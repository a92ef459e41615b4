// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Participant registration and scoring queries.

use livequiz_core::{EngineError, InteractiveId, LeaderboardEntry, ParticipantId, UserId};
use rusqlite::params;

use crate::database::Database;

/// Registers `user_id` as a Participant of `interactive_id`. Idempotent: a
/// second call for the same (interactive, user) pair returns the existing id.
pub async fn register_participant(
    db: &Database,
    interactive_id: InteractiveId,
    user_id: UserId,
) -> Result<ParticipantId, EngineError> {
    db.connection()
        .call(move |conn| {
            if let Some(id) = conn
                .query_row(
                    "SELECT id FROM participants WHERE interactive_id = ?1 AND user_id = ?2",
                    params![interactive_id.0, user_id.0],
                    |row| row.get::<_, i64>(0),
                )
                .ok()
            {
                return Ok(ParticipantId(id));
            }

            conn.execute(
                "INSERT INTO participants (interactive_id, user_id, total_time, joined_at)
                 VALUES (?1, ?2, 0, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![interactive_id.0, user_id.0],
            )?;
            Ok(ParticipantId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn is_participant_registered(
    db: &Database,
    interactive_id: InteractiveId,
    user_id: UserId,
) -> Result<bool, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM participants WHERE interactive_id = ?1 AND user_id = ?2)",
                params![interactive_id.0, user_id.0],
                |row| row.get::<_, bool>(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn drop_participant(
    db: &Database,
    interactive_id: InteractiveId,
    user_id: UserId,
) -> Result<(), EngineError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM user_answers WHERE participant_id IN
                 (SELECT id FROM participants WHERE interactive_id = ?1 AND user_id = ?2)",
                params![interactive_id.0, user_id.0],
            )?;
            conn.execute(
                "DELETE FROM participants WHERE interactive_id = ?1 AND user_id = ?2",
                params![interactive_id.0, user_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn participant_count(
    db: &Database,
    interactive_id: InteractiveId,
) -> Result<i64, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM participants WHERE interactive_id = ?1",
                params![interactive_id.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Adds `seconds` to a participant's `total_time`. The single write site for
/// that field: called on disconnect and at END.
pub async fn accumulate_participant_time(
    db: &Database,
    interactive_id: InteractiveId,
    user_id: UserId,
    seconds: i64,
) -> Result<(), EngineError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE participants SET total_time = total_time + ?1
                 WHERE interactive_id = ?2 AND user_id = ?3",
                params![seconds, interactive_id.0, user_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn user_score(
    db: &Database,
    user_id: UserId,
    interactive_id: InteractiveId,
) -> Result<i64, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(q.score), 0)
                 FROM user_answers ua
                 JOIN participants p ON p.id = ua.participant_id
                 JOIN questions q ON q.id = ua.question_id
                 WHERE p.interactive_id = ?1 AND p.user_id = ?2 AND ua.is_correct = 1",
                params![interactive_id.0, user_id.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Ordered leaderboard: score descending, then total_time ascending.
pub async fn leaderboard(
    db: &Database,
    interactive_id: InteractiveId,
) -> Result<Vec<LeaderboardEntry>, EngineError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, p.total_time,
                        COALESCE((SELECT SUM(q.score) FROM user_answers ua
                                  JOIN questions q ON q.id = ua.question_id
                                  WHERE ua.participant_id = p.id AND ua.is_correct = 1), 0) AS score
                 FROM participants p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.interactive_id = ?1
                 ORDER BY score DESC, p.total_time ASC",
            )?;
            let rows = stmt.query_map(params![interactive_id.0], |row| {
                Ok(LeaderboardEntry {
                    user_id: UserId(row.get(0)?),
                    username: row.get(1)?,
                    total_time: row.get(2)?,
                    score: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    async fn seed_interactive(db: &Database) -> InteractiveId {
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO users (id, external_id, username) VALUES (1, 'e1', 'alice'), (2, 'e2', 'bob')",
                    [],
                )?;
                conn.execute(
                    "INSERT INTO interactives (id, code, title, description, countdown_duration, answer_duration, discussion_duration, created_by)
                     VALUES (1, 'C1', 't', 'd', 5, 20, 10, 1)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();
        InteractiveId(1)
    }

    #[tokio::test]
    async fn register_participant_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let interactive_id = seed_interactive(&db).await;

        let first = register_participant(&db, interactive_id, UserId(1)).await.unwrap();
        let second = register_participant(&db, interactive_id, UserId(1)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn accumulate_participant_time_adds_not_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        let interactive_id = seed_interactive(&db).await;
        register_participant(&db, interactive_id, UserId(1)).await.unwrap();

        accumulate_participant_time(&db, interactive_id, UserId(1), 10).await.unwrap();
        accumulate_participant_time(&db, interactive_id, UserId(1), 5).await.unwrap();

        let entries = leaderboard(&db, interactive_id).await.unwrap();
        assert_eq!(entries[0].total_time, 15);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_score_desc_then_time_asc() {
        let db = Database::open_in_memory().await.unwrap();
        let interactive_id = seed_interactive(&db).await;
        register_participant(&db, interactive_id, UserId(1)).await.unwrap();
        register_participant(&db, interactive_id, UserId(2)).await.unwrap();
        accumulate_participant_time(&db, interactive_id, UserId(1), 20).await.unwrap();
        accumulate_participant_time(&db, interactive_id, UserId(2), 5).await.unwrap();

        let entries = leaderboard(&db, interactive_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        // both have score 0, so the faster (lower total_time) participant ranks first
        assert_eq!(entries[0].user_id, UserId(2));
    }

    #[tokio::test]
    async fn drop_participant_removes_record() {
        let db = Database::open_in_memory().await.unwrap();
        let interactive_id = seed_interactive(&db).await;
        register_participant(&db, interactive_id, UserId(1)).await.unwrap();
        assert!(is_participant_registered(&db, interactive_id, UserId(1)).await.unwrap());

        drop_participant(&db, interactive_id, UserId(1)).await.unwrap();
        assert!(!is_participant_registered(&db, interactive_id, UserId(1)).await.unwrap());
    }
}
