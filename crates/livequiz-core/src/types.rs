// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the session engine, storage, and gateway crates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifies an Interactive (quiz definition) and its runtime Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractiveId(pub i64);

/// Identifies a Question within an Interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub i64);

/// Identifies an Answer choice belonging to a Question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnswerId(pub i64);

/// Identifies a registered Participant record (interactive_id + user_id pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub i64);

/// Opaque external user identifier, passed through from whatever authenticates
/// the upgrade request. The core never interprets this beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// The type of a Question, governing both its answer schema and its
/// correctness rule. See [`crate::ingest`] in the engine crate for the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multi,
    Text,
}

/// One selectable choice under a SINGLE/MULTI question.
///
/// `is_correct` is never serialized to a PARTICIPANT-facing payload during
/// QUESTION; the wire layer strips it explicitly rather than relying on a
/// serde attribute, since the same struct is also used leader-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub text: String,
    pub is_correct: bool,
}

/// A Question and its Answers, immutable for the lifetime of a Session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// 1-based, strictly sequential within an interactive.
    pub position: i64,
    pub text: String,
    /// Points awarded for a correct answer, in 1..=5.
    pub score: i64,
    pub question_type: QuestionType,
    pub image_url: Option<String>,
    pub answers: Vec<Answer>,
}

impl Question {
    /// The id of the single correct answer for a SINGLE question.
    ///
    /// Panics if called on a non-SINGLE question or if the invariant "exactly
    /// one correct answer" does not hold; callers must only invoke this after
    /// the Question has been loaded through the repository, which enforces
    /// the per-type invariants from the data model.
    pub fn single_correct_id(&self) -> AnswerId {
        self.answers
            .iter()
            .find(|a| a.is_correct)
            .expect("SINGLE question must have exactly one correct answer")
            .id
    }

    /// The set of correct answer ids for a MULTI question.
    pub fn multi_correct_ids(&self) -> HashSet<AnswerId> {
        self.answers
            .iter()
            .filter(|a| a.is_correct)
            .map(|a| a.id)
            .collect()
    }

    pub fn answer_ids(&self) -> HashSet<AnswerId> {
        self.answers.iter().map(|a| a.id).collect()
    }
}

/// Immutable metadata for an Interactive, as loaded once when a Session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveMeta {
    pub id: InteractiveId,
    pub code: String,
    pub title: String,
    pub description: String,
    pub countdown_duration: i64,
    pub answer_duration: i64,
    pub discussion_duration: i64,
}

/// A registered Participant of an interactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub interactive_id: InteractiveId,
    pub user_id: UserId,
    /// Seconds accumulated across all QUESTION phases the participant was
    /// connected during. Maintained by the Session on disconnect and at END
    /// -- this is the single write site per the design notes.
    pub total_time: i64,
    pub joined_at: String,
}

/// The tagged-union answer payload, keyed by the Question's type.
///
/// Validation happens at this boundary: constructing one of these from an
/// inbound frame already means the shape matched the expected question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AnswerPayload {
    Single { answer_id: AnswerId },
    Multi { answer_ids: HashSet<AnswerId> },
    Text {
        raw_text: String,
        matched_answer_id: Option<AnswerId>,
    },
}

/// A participant's recorded answer to one question.
///
/// Unique on (participant_id, question_id): a resubmit overwrites the prior row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub participant_id: ParticipantId,
    pub question_id: QuestionId,
    pub payload: AnswerPayload,
    pub is_correct: bool,
    pub time_seconds: i64,
    pub created_at: String,
}

/// One row of a computed leaderboard: score descending, then total_time ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub username: String,
    pub score: i64,
    pub total_time: i64,
}

/// Per-answer selection percentage, for SINGLE/MULTI discussion payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionPercentage {
    pub answer_id: AnswerId,
    pub percentage: f64,
}

/// Per-variant match percentage, for TEXT discussion payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatchPercentage {
    pub answer_id: AnswerId,
    pub text: String,
    pub percentage: f64,
}

/// A connection's role in the Connection Registry (C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Participant,
    Admin,
    Organizer,
}

/// The Session state machine's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Countdown,
    Question,
    Discussion,
    End,
}

/// Idle sub-state shared by the WAITING idle timer and the paused-idle timer.
///
/// Reconciles the two idle-timeout descriptions in the data model (`ACTIVE`/
/// `IDLE`/`WARNING`) and the wire pause envelope (`no`/`yes`/`timer_n`): they
/// are the same sub-state-machine observed from two layers. `Active` (wire
/// `no`) means running/not idle-tracked; `Idle` (wire `yes`) is the first
/// countdown window; `Warning` (wire `timer_n`) is the second, shorter window
/// after which the Session is force-ended. See `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleState {
    Active,
    Idle,
    Warning,
}

/// Why a Session reached END, used to decide whether `conducted` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Leader drove the session through at least one DISCUSSION phase, or
    /// issued `END` after COUNTDOWN/QUESTION/DISCUSSION started.
    Completed,
    /// Leader issued `END` while still in WAITING, or disconnected from
    /// WAITING, or the WAITING idle timer expired, or an admin force-delete.
    Cancelled,
    /// A fatal invariant violation aborted the Session.
    Aborted,
}
