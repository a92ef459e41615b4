// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question and answer-aggregate queries.

use std::collections::HashMap;

use livequiz_core::{
    Answer, AnswerId, EngineError, InteractiveId, Question, QuestionId, QuestionType,
    SelectionPercentage, TextMatchPercentage,
};
use rusqlite::params;

use crate::database::Database;

fn question_type_from_str(s: &str) -> QuestionType {
    match s {
        "single" => QuestionType::Single,
        "multi" => QuestionType::Multi,
        "text" => QuestionType::Text,
        other => panic!("unknown question_type in database: {other}"),
    }
}

pub fn question_type_as_str(t: QuestionType) -> &'static str {
    match t {
        QuestionType::Single => "single",
        QuestionType::Multi => "multi",
        QuestionType::Text => "text",
    }
}

pub async fn load_questions(
    db: &Database,
    interactive_id: InteractiveId,
) -> Result<Vec<Question>, EngineError> {
    db.connection()
        .call(move |conn| {
            let mut q_stmt = conn.prepare(
                "SELECT id, position, text, score, question_type, image_url
                 FROM questions WHERE interactive_id = ?1 ORDER BY position ASC",
            )?;
            let mut questions: Vec<Question> = q_stmt
                .query_map(params![interactive_id.0], |row| {
                    Ok(Question {
                        id: QuestionId(row.get(0)?),
                        position: row.get(1)?,
                        text: row.get(2)?,
                        score: row.get(3)?,
                        question_type: question_type_from_str(&row.get::<_, String>(4)?),
                        image_url: row.get(5)?,
                        answers: Vec::new(),
                    })
                })?
                .collect::<Result<_, _>>()?;

            let mut a_stmt = conn.prepare(
                "SELECT id, question_id, text, is_correct FROM answers WHERE question_id = ?1 ORDER BY id ASC",
            )?;
            for question in &mut questions {
                let answers = a_stmt
                    .query_map(params![question.id.0], |row| {
                        Ok(Answer {
                            id: AnswerId(row.get(0)?),
                            question_id: QuestionId(row.get(1)?),
                            text: row.get(2)?,
                            is_correct: row.get(3)?,
                        })
                    })?
                    .collect::<Result<_, _>>()?;
                question.answers = answers;
            }
            Ok(questions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn selection_percentages(
    db: &Database,
    question_id: QuestionId,
) -> Result<Vec<SelectionPercentage>, EngineError> {
    db.connection()
        .call(move |conn| {
            let answer_ids: Vec<i64> = conn
                .prepare("SELECT id FROM answers WHERE question_id = ?1 ORDER BY id ASC")?
                .query_map(params![question_id.0], |row| row.get(0))?
                .collect::<Result<_, _>>()?;

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_answers WHERE question_id = ?1 AND payload_kind IN ('single', 'multi')",
                params![question_id.0],
                |row| row.get(0),
            )?;

            let mut counts: HashMap<i64, i64> = HashMap::new();

            let mut single_stmt = conn.prepare(
                "SELECT answer_id FROM user_answers WHERE question_id = ?1 AND payload_kind = 'single'",
            )?;
            for row in single_stmt.query_map(params![question_id.0], |row| row.get::<_, i64>(0))? {
                *counts.entry(row?).or_insert(0) += 1;
            }

            let mut multi_stmt = conn.prepare(
                "SELECT answer_ids FROM user_answers WHERE question_id = ?1 AND payload_kind = 'multi'",
            )?;
            for row in multi_stmt.query_map(params![question_id.0], |row| row.get::<_, String>(0))? {
                let ids: Vec<i64> = serde_json::from_str(&row?).unwrap_or_default();
                for id in ids {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }

            Ok(answer_ids
                .into_iter()
                .map(|id| {
                    let count = counts.get(&id).copied().unwrap_or(0);
                    let percentage = if total > 0 {
                        (count as f64 / total as f64) * 100.0
                    } else {
                        0.0
                    };
                    SelectionPercentage {
                        answer_id: AnswerId(id),
                        percentage,
                    }
                })
                .collect())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn text_match_percentages(
    db: &Database,
    question_id: QuestionId,
) -> Result<Vec<TextMatchPercentage>, EngineError> {
    db.connection()
        .call(move |conn| {
            let variants: Vec<(i64, String)> = conn
                .prepare("SELECT id, text FROM answers WHERE question_id = ?1 ORDER BY id ASC")?
                .query_map(params![question_id.0], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<Result<_, _>>()?;

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_answers WHERE question_id = ?1 AND payload_kind = 'text'",
                params![question_id.0],
                |row| row.get(0),
            )?;

            let mut counts: HashMap<i64, i64> = HashMap::new();
            let mut stmt = conn.prepare(
                "SELECT matched_answer_id FROM user_answers
                 WHERE question_id = ?1 AND payload_kind = 'text' AND matched_answer_id IS NOT NULL",
            )?;
            for row in stmt.query_map(params![question_id.0], |row| row.get::<_, i64>(0))? {
                *counts.entry(row?).or_insert(0) += 1;
            }

            Ok(variants
                .into_iter()
                .map(|(id, text)| {
                    let count = counts.get(&id).copied().unwrap_or(0);
                    let percentage = if total > 0 {
                        (count as f64 / total as f64) * 100.0
                    } else {
                        0.0
                    };
                    TextMatchPercentage {
                        answer_id: AnswerId(id),
                        text,
                        percentage,
                    }
                })
                .collect())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
