use serde::{Deserialize, Serialize};

use crate::model::answer::AnswerChoice;
use crate::model::ids::QuestionId;

/// Outcome of one question within a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: QuestionId,
    pub answer: AnswerChoice,
    pub is_correct: bool,
    pub points_earned: u32,
    pub max_points: u32,
    pub response_time_ms: u64,
    pub hint_used: bool,
}

//
// ─── RESULT SUMMARY ────────────────────────────────────────────────────────────
//

/// Locally computed, authoritative score of a finished session.
///
/// Built once from the per-question responses; there is no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    score: u64,
    max_score: u64,
    percentage: u8,
    correct_count: u32,
    total_count: u32,
    time_taken_seconds: u64,
    per_question_responses: Vec<QuestionResponse>,
}

impl ResultSummary {
    /// Aggregate responses (in question order) into a summary.
    #[must_use]
    pub fn from_responses(responses: Vec<QuestionResponse>, time_taken_seconds: u64) -> Self {
        let mut score: u64 = 0;
        let mut max_score: u64 = 0;
        let mut correct_count: u32 = 0;
        for response in &responses {
            score = score.saturating_add(u64::from(response.points_earned));
            max_score = max_score.saturating_add(u64::from(response.max_points));
            if response.is_correct {
                correct_count = correct_count.saturating_add(1);
            }
        }
        let total_count = u32::try_from(responses.len()).unwrap_or(u32::MAX);

        Self {
            score,
            max_score,
            percentage: percentage(score, max_score),
            correct_count,
            total_count,
            time_taken_seconds,
            per_question_responses: responses,
        }
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u64 {
        self.max_score
    }

    /// Score as a whole-number percentage of the maximum, `0` when nothing was at stake.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn time_taken_seconds(&self) -> u64 {
        self.time_taken_seconds
    }

    #[must_use]
    pub fn per_question_responses(&self) -> &[QuestionResponse] {
        &self.per_question_responses
    }
}

fn percentage(score: u64, max_score: u64) -> u8 {
    if max_score == 0 {
        return 0;
    }
    let score = score.min(max_score);
    // Round half up without going through floats.
    let pct = (score * 200 + max_score) / (max_score * 2);
    u8::try_from(pct).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionKey;

    fn response(id: u64, correct: bool, points: u32) -> QuestionResponse {
        QuestionResponse {
            question_id: QuestionId::new(id),
            answer: if correct {
                AnswerChoice::Option(OptionKey::A)
            } else {
                AnswerChoice::Timeout
            },
            is_correct: correct,
            points_earned: if correct { points } else { 0 },
            max_points: points,
            response_time_ms: 1_000,
            hint_used: false,
        }
    }

    #[test]
    fn summary_counts_points_and_correct_answers() {
        let summary = ResultSummary::from_responses(
            vec![response(1, true, 10), response(2, false, 10), response(3, true, 20)],
            42,
        );

        assert_eq!(summary.score(), 30);
        assert_eq!(summary.max_score(), 40);
        assert_eq!(summary.percentage(), 75);
        assert_eq!(summary.correct_count(), 2);
        assert_eq!(summary.total_count(), 3);
        assert_eq!(summary.time_taken_seconds(), 42);
    }

    #[test]
    fn percentage_rounds_and_handles_zero_max() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 5), 100);
    }
}
