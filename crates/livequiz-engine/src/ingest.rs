// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer Ingest (C5): validates a submitted answer against the currently
//! active question and computes correctness.
//!
//! Grounded on `original_source/src/websocket/session_manager.py
//! ::handle_participant_message` for the exact validation order: membership
//! is checked before correctness, and MULTI correctness is set equality, not
//! subset -- a participant who selects a strict subset of the correct set is
//! wrong, full stop. Malformed or out-of-phase submissions are the caller's
//! concern (§4.4: "silently dropped, no error frame"); this module only
//! decides whether a well-formed submission is valid and, if so, correct.

use livequiz_core::wire::ParticipantSubmission;
use livequiz_core::{AnswerPayload, Question, QuestionType};

/// The outcome of validating one submission against a question.
pub struct IngestResult {
    pub payload: AnswerPayload,
    pub is_correct: bool,
}

/// Validates and scores a raw wire submission against `question`.
///
/// Returns `None` for a malformed submission (wrong shape for the question's
/// type, an unlisted answer id, or an empty MULTI set) -- callers must treat
/// `None` as "drop silently", never as an error frame.
pub fn validate_submission(
    question: &Question,
    submission: &ParticipantSubmission,
) -> Option<IngestResult> {
    match question.question_type {
        QuestionType::Single => validate_single(question, submission),
        QuestionType::Multi => validate_multi(question, submission),
        QuestionType::Text => validate_text(question, submission),
    }
}

fn validate_single(question: &Question, submission: &ParticipantSubmission) -> Option<IngestResult> {
    let answer_id = submission.answer_id?;
    if !question.answer_ids().contains(&answer_id) {
        return None;
    }
    let is_correct = answer_id == question.single_correct_id();
    Some(IngestResult {
        payload: AnswerPayload::Single { answer_id },
        is_correct,
    })
}

fn validate_multi(question: &Question, submission: &ParticipantSubmission) -> Option<IngestResult> {
    let ids = submission.answer_ids.as_ref()?;
    if ids.is_empty() {
        return None;
    }
    let valid_ids = question.answer_ids();
    let submitted: std::collections::HashSet<_> = ids.iter().copied().collect();
    if !submitted.is_subset(&valid_ids) {
        return None;
    }
    let correct = question.multi_correct_ids();
    let is_correct = submitted == correct;
    Some(IngestResult {
        payload: AnswerPayload::Multi { answer_ids: submitted },
        is_correct,
    })
}

fn validate_text(question: &Question, submission: &ParticipantSubmission) -> Option<IngestResult> {
    let raw_text = submission.answer_text.clone()?;
    let normalized = normalize_text(&raw_text);
    let matched = question
        .answers
        .iter()
        .find(|a| normalize_text(&a.text) == normalized)
        .map(|a| a.id);
    let is_correct = matched.is_some();
    Some(IngestResult {
        payload: AnswerPayload::Text {
            raw_text,
            matched_answer_id: matched,
        },
        is_correct,
    })
}

/// Casefold + trim, per §4.4's TEXT normalization rule (§8 invariant 11).
fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use livequiz_core::{Answer, AnswerId, QuestionId};
    use std::collections::HashSet;

    fn single_question() -> Question {
        Question {
            id: QuestionId(1),
            position: 1,
            text: "q".into(),
            score: 2,
            question_type: QuestionType::Single,
            image_url: None,
            answers: vec![
                Answer { id: AnswerId(10), question_id: QuestionId(1), text: "A".into(), is_correct: true },
                Answer { id: AnswerId(11), question_id: QuestionId(1), text: "B".into(), is_correct: false },
            ],
        }
    }

    fn multi_question() -> Question {
        Question {
            id: QuestionId(1),
            position: 1,
            text: "q".into(),
            score: 2,
            question_type: QuestionType::Multi,
            image_url: None,
            answers: vec![
                Answer { id: AnswerId(1), question_id: QuestionId(1), text: "A".into(), is_correct: true },
                Answer { id: AnswerId(2), question_id: QuestionId(1), text: "B".into(), is_correct: true },
                Answer { id: AnswerId(3), question_id: QuestionId(1), text: "C".into(), is_correct: false },
            ],
        }
    }

    fn text_question() -> Question {
        Question {
            id: QuestionId(1),
            position: 1,
            text: "q".into(),
            score: 2,
            question_type: QuestionType::Text,
            image_url: None,
            answers: vec![Answer {
                id: AnswerId(1),
                question_id: QuestionId(1),
                text: "Юпитер".into(),
                is_correct: true,
            }],
        }
    }

    #[test]
    fn single_correct_answer_is_scored_correct() {
        let sub = ParticipantSubmission { answer_id: Some(AnswerId(10)), answer_ids: None, answer_text: None };
        let result = validate_submission(&single_question(), &sub).unwrap();
        assert!(result.is_correct);
    }

    #[test]
    fn single_unlisted_answer_id_is_rejected() {
        let sub = ParticipantSubmission { answer_id: Some(AnswerId(99)), answer_ids: None, answer_text: None };
        assert!(validate_submission(&single_question(), &sub).is_none());
    }

    #[test]
    fn multi_strict_subset_of_correct_is_not_correct() {
        // S2: correct={1,2}; submitted={1}. Must be wrong, not a partial credit.
        let sub = ParticipantSubmission { answer_id: None, answer_ids: Some(vec![AnswerId(1)]), answer_text: None };
        let result = validate_submission(&multi_question(), &sub).unwrap();
        assert!(!result.is_correct);
        assert_eq!(
            result.payload,
            AnswerPayload::Multi { answer_ids: HashSet::from([AnswerId(1)]) }
        );
    }

    #[test]
    fn multi_exact_set_match_is_correct() {
        let sub = ParticipantSubmission { answer_id: None, answer_ids: Some(vec![AnswerId(2), AnswerId(1)]), answer_text: None };
        let result = validate_submission(&multi_question(), &sub).unwrap();
        assert!(result.is_correct);
    }

    #[test]
    fn multi_empty_set_is_rejected() {
        let sub = ParticipantSubmission { answer_id: None, answer_ids: Some(vec![]), answer_text: None };
        assert!(validate_submission(&multi_question(), &sub).is_none());
    }

    #[test]
    fn multi_with_unlisted_id_is_rejected() {
        let sub = ParticipantSubmission { answer_id: None, answer_ids: Some(vec![AnswerId(1), AnswerId(99)]), answer_text: None };
        assert!(validate_submission(&multi_question(), &sub).is_none());
    }

    #[test]
    fn text_matches_case_and_whitespace_insensitively() {
        // S3: accepted "Юпитер", submitted "  юпитер ".
        let sub = ParticipantSubmission { answer_id: None, answer_ids: None, answer_text: Some("  юпитер ".into()) };
        let result = validate_submission(&text_question(), &sub).unwrap();
        assert!(result.is_correct);
        assert_eq!(result.payload, AnswerPayload::Text {
            raw_text: "  юпитер ".into(),
            matched_answer_id: Some(AnswerId(1)),
        });
    }

    #[test]
    fn text_no_match_is_recorded_incorrect_not_rejected() {
        let sub = ParticipantSubmission { answer_id: None, answer_ids: None, answer_text: Some("mars".into()) };
        let result = validate_submission(&text_question(), &sub).unwrap();
        assert!(!result.is_correct);
    }
}
