// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast Projector (C4): builds the per-phase, per-role outbound frame.
//!
//! Every builder here is a pure function over already-fetched data -- the
//! async tick loop in [`crate::session`] is responsible for fetching
//! aggregates (percentages, leaderboard) at most once per tick and passing
//! them in, per §4.3's "fetch aggregates at most once per broadcast"
//! invariant. This mirrors the teacher's pattern of building one shared
//! payload and cloning/personalizing it per recipient rather than querying
//! per recipient.

use serde_json::json;

use livequiz_core::wire::{wire_choices_for, OutboundFrame, PauseFrame, PauseWireState};
use livequiz_core::{
    IdleState, InteractiveMeta, LeaderboardEntry, Phase, Question, QuestionType,
    SelectionPercentage, TextMatchPercentage, UserAnswer,
};

use crate::winners::OwnStanding;

fn pause_frame(idle_state: IdleState, idle_seconds_left: i64, tick_step: u8) -> Option<PauseFrame> {
    if tick_step == 1 && idle_state == IdleState::Active {
        return None;
    }
    Some(PauseFrame {
        state: PauseWireState::from(idle_state),
        timer_n: idle_seconds_left.max(0),
    })
}

pub fn waiting_frame(
    interactive: &InteractiveMeta,
    idle_state: IdleState,
    idle_seconds_left: i64,
    connected_count: usize,
) -> OutboundFrame {
    OutboundFrame {
        stage: Phase::Waiting,
        data: json!({
            "title": interactive.title,
            "description": interactive.description,
            "code": interactive.code,
            "connected_count": connected_count,
        }),
        pause: pause_frame(idle_state, idle_seconds_left, 1),
        data_answers: None,
        winners: None,
        score: None,
    }
}

pub fn countdown_frame(remaining: i64, duration: i64) -> OutboundFrame {
    OutboundFrame {
        stage: Phase::Countdown,
        data: json!({ "remaining": remaining.max(0), "duration": duration }),
        pause: None,
        data_answers: None,
        winners: None,
        score: None,
    }
}

/// Identical for LEADER and PARTICIPANT: the wire choice type already omits
/// `is_correct`, so there is nothing role-specific to strip.
pub fn question_frame(
    question: &Question,
    remaining: i64,
    duration: i64,
    idle_state: IdleState,
    idle_seconds_left: i64,
    tick_step: u8,
) -> OutboundFrame {
    let mut data = json!({
        "id": question.id,
        "position": question.position,
        "text": question.text,
        "score": question.score,
        "type": question.question_type,
        "image_url": question.image_url,
        "remaining": remaining.max(0),
        "duration": duration,
    });
    if let Some(choices) = wire_choices_for(question) {
        data["answers"] = serde_json::to_value(choices).unwrap_or(serde_json::Value::Null);
    }
    OutboundFrame {
        stage: Phase::Question,
        data,
        pause: pause_frame(idle_state, idle_seconds_left, tick_step),
        data_answers: None,
        winners: None,
        score: None,
    }
}

/// Aggregates for a DISCUSSION phase, fetched once per tick and reused for
/// every recipient.
pub enum DiscussionAggregates {
    Choices(Vec<SelectionPercentage>),
    Text(Vec<TextMatchPercentage>),
}

/// LEADER view of a DISCUSSION tick: never includes per-participant feedback.
pub fn discussion_frame_for_leader(
    question: &Question,
    aggregates: &DiscussionAggregates,
    top3: &[LeaderboardEntry],
) -> OutboundFrame {
    let data_answers = discussion_data_answers(question, aggregates, None);
    OutboundFrame {
        stage: Phase::Discussion,
        data: json!({
            "id": question.id,
            "position": question.position,
            "type": question.question_type,
        }),
        pause: None,
        data_answers: Some(data_answers),
        winners: Some(top3.to_vec()),
        score: None,
    }
}

/// PARTICIPANT view: adds their own matched/unmatched text feedback (for
/// TEXT questions) and their own running score.
pub fn discussion_frame_for_participant(
    question: &Question,
    aggregates: &DiscussionAggregates,
    top3: &[LeaderboardEntry],
    own_answer: Option<&UserAnswer>,
    own_score: i64,
) -> OutboundFrame {
    let data_answers = discussion_data_answers(question, aggregates, own_answer);
    OutboundFrame {
        stage: Phase::Discussion,
        data: json!({
            "id": question.id,
            "position": question.position,
            "type": question.question_type,
        }),
        pause: None,
        data_answers: Some(data_answers),
        winners: Some(top3.to_vec()),
        score: Some(json!(own_score)),
    }
}

fn discussion_data_answers(
    question: &Question,
    aggregates: &DiscussionAggregates,
    own_answer: Option<&UserAnswer>,
) -> serde_json::Value {
    match aggregates {
        DiscussionAggregates::Choices(percentages) => {
            let correct_ids: Vec<_> = match question.question_type {
                QuestionType::Single => vec![question.single_correct_id()],
                QuestionType::Multi => question.multi_correct_ids().into_iter().collect(),
                QuestionType::Text => Vec::new(),
            };
            json!({
                "correct_answer_ids": correct_ids,
                "percentages": percentages,
            })
        }
        DiscussionAggregates::Text(variants) => {
            // §4.1 DISCUSSION: a participant whose own answer matched sees
            // only their own matched variant and its percentage; otherwise
            // (or for the leader) the full accepted-variant list.
            let matched = own_answer.and_then(|ua| match &ua.payload {
                livequiz_core::AnswerPayload::Text { matched_answer_id, .. } => *matched_answer_id,
                _ => None,
            });
            match matched {
                Some(id) => {
                    let own_variant = variants.iter().find(|v| v.answer_id == id);
                    json!({
                        "matched": own_variant,
                        "is_correct": true,
                    })
                }
                None if own_answer.is_some() => json!({
                    "variants": variants,
                    "is_correct": false,
                }),
                None => json!({ "variants": variants }),
            }
        }
    }
}

pub fn end_frame(top3: &[LeaderboardEntry], own_standing: Option<OwnStanding>) -> OutboundFrame {
    OutboundFrame {
        stage: Phase::End,
        data: json!({}),
        pause: None,
        data_answers: None,
        winners: Some(top3.to_vec()),
        score: own_standing.map(|s| {
            json!({
                "position": s.position,
                "score": s.score,
                "total_time": s.total_time,
            })
        }),
    }
}
