// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive metadata queries.

use livequiz_core::{EngineError, InteractiveId, InteractiveMeta, QuestionId, UserId};
use rusqlite::params;

use crate::database::Database;

pub async fn load_interactive_meta(
    db: &Database,
    id: InteractiveId,
) -> Result<InteractiveMeta, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, code, title, description, countdown_duration, answer_duration, discussion_duration
                 FROM interactives WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(InteractiveMeta {
                        id: InteractiveId(row.get(0)?),
                        code: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        countdown_duration: row.get(4)?,
                        answer_duration: row.get(5)?,
                        discussion_duration: row.get(6)?,
                    })
                },
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn exists_interactive(db: &Database, id: InteractiveId) -> Result<bool, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM interactives WHERE id = ?1)",
                params![id.0],
                |row| row.get::<_, bool>(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn is_conducted(db: &Database, id: InteractiveId) -> Result<bool, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT conducted FROM interactives WHERE id = ?1",
                params![id.0],
                |row| row.get::<_, bool>(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn is_creator(
    db: &Database,
    interactive_id: InteractiveId,
    user_id: UserId,
) -> Result<bool, EngineError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM interactives WHERE id = ?1 AND created_by = ?2)",
                params![interactive_id.0, user_id.0],
                |row| row.get::<_, bool>(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn mark_conducted(
    db: &Database,
    interactive_id: InteractiveId,
    completed_at: &str,
) -> Result<(), EngineError> {
    let completed_at = completed_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE interactives SET conducted = 1, date_completed = ?1 WHERE id = ?2",
                params![completed_at, interactive_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn record_question_time(
    db: &Database,
    question_id: QuestionId,
    seconds: i64,
) -> Result<(), EngineError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE questions SET recorded_seconds = ?1 WHERE id = ?2",
                params![seconds, question_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
