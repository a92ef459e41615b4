// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON wire contract for the transport adapter (C7), per the outbound frame
//! envelope and inbound frame schemas.

use serde::{Deserialize, Serialize};

use crate::types::{AnswerId, LeaderboardEntry, Phase, QuestionType};

/// Inbound command from a LEADER connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "interactive_status")]
pub enum LeaderCommand {
    Going,
    Pause,
    MorePause,
    End,
}

/// Inbound answer submission from a PARTICIPANT connection.
///
/// Untagged: the question type determines which shape is expected, but the
/// wire frame itself is distinguished structurally (matches the source
/// system's three mutually-exclusive optional fields).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParticipantSubmission {
    #[serde(default)]
    pub answer_id: Option<AnswerId>,
    #[serde(default)]
    pub answer_ids: Option<Vec<AnswerId>>,
    #[serde(default)]
    pub answer_text: Option<String>,
}

/// Wire form of the idle/pause sub-state, `{state, timer_n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseFrame {
    pub state: PauseWireState,
    pub timer_n: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseWireState {
    No,
    Yes,
    TimerN,
}

impl From<crate::types::IdleState> for PauseWireState {
    fn from(s: crate::types::IdleState) -> Self {
        match s {
            crate::types::IdleState::Active => PauseWireState::No,
            crate::types::IdleState::Idle => PauseWireState::Yes,
            crate::types::IdleState::Warning => PauseWireState::TimerN,
        }
    }
}

/// An answer choice as sent to clients: never includes `is_correct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAnswerChoice {
    pub id: AnswerId,
    pub text: String,
}

/// Outbound frame envelope: `{stage, data, pause?, data_answers?, winners?, score?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub stage: Phase,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<PauseFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_answers: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<LeaderboardEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<serde_json::Value>,
}

/// A reason why a WebSocket upgrade was rejected, per §6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeRejection {
    InteractiveNotFound,
    InteractiveConducted,
    UserNotFound,
    NotCreator,
    ParticipantNotRegistered,
}

impl UpgradeRejection {
    /// A short machine-readable policy code, sent as the close reason.
    pub fn code(self) -> &'static str {
        match self {
            UpgradeRejection::InteractiveNotFound => "interactive_not_found",
            UpgradeRejection::InteractiveConducted => "interactive_conducted",
            UpgradeRejection::UserNotFound => "user_not_found",
            UpgradeRejection::NotCreator => "not_creator",
            UpgradeRejection::ParticipantNotRegistered => "participant_not_registered",
        }
    }
}

/// Returns the question type's wire-visible answer choices, or `None` for
/// TEXT questions (which omit choices entirely per §4.1 QUESTION payload).
pub fn wire_choices_for(question: &crate::types::Question) -> Option<Vec<WireAnswerChoice>> {
    match question.question_type {
        QuestionType::Text => None,
        QuestionType::Single | QuestionType::Multi => Some(
            question
                .answers
                .iter()
                .map(|a| WireAnswerChoice {
                    id: a.id,
                    text: a.text.clone(),
                })
                .collect(),
        ),
    }
}
