//! Scoring of a single answer against its question.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerChoice, Question};

/// Verdict for one answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub is_correct: bool,
    pub points_earned: u32,
}

/// Resolve a choice against a question.
///
/// Correct only on exact key equality with the question's correct key; the timeout
/// sentinel is never correct. No partial credit and no hint penalty at this layer.
#[must_use]
pub fn resolve(question: &Question, choice: AnswerChoice) -> Resolution {
    let is_correct = choice.option_key() == Some(question.correct_option_key());
    Resolution {
        is_correct,
        points_earned: if is_correct { question.point_value() } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, OptionKey, QuestionDraft, QuestionId};

    fn question(correct: OptionKey, points: u32) -> Question {
        QuestionDraft {
            id: QuestionId::new(1),
            prompt: "Pick".into(),
            options: [
                Some("a".into()),
                Some("b".into()),
                Some("c".into()),
                Some("d".into()),
            ],
            correct_option_key: correct,
            explanation: None,
            hint: None,
            point_value: points,
            time_limit_seconds: 10,
            difficulty: Difficulty::Medium,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn correct_key_earns_full_points_for_every_slot() {
        for key in OptionKey::ALL {
            let q = question(key, 15);
            let verdict = resolve(&q, AnswerChoice::Option(key));
            assert!(verdict.is_correct);
            assert_eq!(verdict.points_earned, 15);
        }
    }

    #[test]
    fn timeout_is_always_wrong() {
        for key in OptionKey::ALL {
            let verdict = resolve(&question(key, 15), AnswerChoice::Timeout);
            assert!(!verdict.is_correct);
            assert_eq!(verdict.points_earned, 0);
        }
    }

    #[test]
    fn wrong_key_earns_nothing_and_is_repeatable() {
        let q = question(OptionKey::C, 8);
        let first = resolve(&q, AnswerChoice::Option(OptionKey::A));
        let second = resolve(&q, AnswerChoice::Option(OptionKey::A));
        assert_eq!(first, second);
        assert_eq!(first.points_earned, 0);
        assert!(!first.is_correct);
    }
}
