use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerChoice, QuestionResponse, ResultSummary};
use quiz_core::resolve;
use quiz_remote::{
    GamificationSink, GamificationUpdate, QuizResultMetadata, SubmissionPayload,
    SubmissionReceipt, SubmissionSink, SubmittedAnswer,
};
use serde::Serialize;
use tokio::time::Instant;

use super::state::QuizSession;
use crate::error::SessionError;

/// Everything derived from a finished session, computed exactly once.
///
/// A retry resubmits `payload` unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    pub summary: ResultSummary,
    pub payload: SubmissionPayload,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl Finalization {
    /// Score a finished session.
    ///
    /// A question without a recorded answer is scored as a timeout and logged; that can
    /// only happen if the session invariants were broken.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalTransition` unless the session is finished.
    pub fn from_session(
        session: &QuizSession,
        now: Instant,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if !session.phase().is_finished() {
            return Err(SessionError::IllegalTransition {
                operation: "finalize",
                phase: session.phase(),
            });
        }

        let mut responses = Vec::with_capacity(session.questions().len());
        let mut answers = Vec::with_capacity(session.questions().len());
        for question in session.questions() {
            let question_id = question.id();
            let answer = session.answer_for(question_id).unwrap_or_else(|| {
                tracing::warn!(
                    session_id = %session.session_id(),
                    %question_id,
                    "finished session has no recorded answer; scoring as timeout"
                );
                AnswerChoice::Timeout
            });
            let response_time_ms = session
                .response_time_ms(question_id)
                .unwrap_or_else(|| u64::from(question.time_limit_seconds()) * 1_000);
            let resolution = resolve(question, answer);

            responses.push(QuestionResponse {
                question_id,
                answer,
                is_correct: resolution.is_correct,
                points_earned: resolution.points_earned,
                max_points: question.point_value(),
                response_time_ms,
                hint_used: session.hint_used(question_id),
            });
            answers.push(SubmittedAnswer {
                question_id,
                answer,
                response_time_ms,
            });
        }

        let time_taken_seconds = session
            .started_at()
            .map_or(0, |started| now.saturating_duration_since(started).as_secs());
        let summary = ResultSummary::from_responses(responses, time_taken_seconds);
        let payload = SubmissionPayload {
            session_id: session.session_id(),
            quiz_id: session.quiz_id(),
            answers,
            time_taken_seconds,
            hints_used: session.hints_used(),
        };

        Ok(Self {
            summary,
            payload,
            started_at: session.started_wall(),
            completed_at,
        })
    }

    fn metadata(&self, receipt: &SubmissionReceipt) -> QuizResultMetadata {
        QuizResultMetadata {
            session_id: self.payload.session_id,
            quiz_id: self.payload.quiz_id,
            hints_used: u32::try_from(self.payload.hints_used.len()).unwrap_or(u32::MAX),
            started_at: self.started_at,
            completed_at: self.completed_at,
            server_score: receipt.final_score.or(receipt.score),
        }
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum SubmissionStatus {
    Submitted { receipt: SubmissionReceipt },
    Failed { reason: String },
}

/// Result shown to the student. `summary` is always the local computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalReport {
    pub summary: ResultSummary,
    pub submission: SubmissionStatus,
    pub gamification: Option<GamificationUpdate>,
}

impl FinalReport {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self.submission, SubmissionStatus::Submitted { .. })
    }
}

//
// ─── FINALIZER ─────────────────────────────────────────────────────────────────
//

/// Hands a finalized session to the scoring and gamification collaborators.
#[derive(Clone)]
pub struct Finalizer {
    submissions: Arc<dyn SubmissionSink>,
    gamification: Arc<dyn GamificationSink>,
}

impl Finalizer {
    #[must_use]
    pub fn new(
        submissions: Arc<dyn SubmissionSink>,
        gamification: Arc<dyn GamificationSink>,
    ) -> Self {
        Self {
            submissions,
            gamification,
        }
    }

    /// Submit the payload once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionFailure` when the sink rejects or errors.
    pub async fn try_submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SessionError> {
        self.submissions
            .submit_quiz(payload)
            .await
            .map_err(SessionError::SubmissionFailure)
    }

    /// Submit, then record gamification. Never fails: remote problems degrade the report
    /// to the local summary.
    pub async fn deliver(&self, finalization: &Finalization) -> FinalReport {
        let session_id = finalization.payload.session_id;
        let receipt = match self.try_submit(&finalization.payload).await {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "quiz submission failed; keeping local result");
                return FinalReport {
                    summary: finalization.summary.clone(),
                    submission: SubmissionStatus::Failed {
                        reason: err.to_string(),
                    },
                    gamification: None,
                };
            }
        };

        match receipt.score {
            Some(remote_score) if remote_score != finalization.summary.score() => {
                tracing::info!(
                    %session_id,
                    local = finalization.summary.score(),
                    remote = remote_score,
                    "scoring service reported a different base score"
                );
            }
            _ => {}
        }

        let metadata = finalization.metadata(&receipt);
        let gamification = match self
            .gamification
            .record_quiz_result(&finalization.summary, &metadata)
            .await
        {
            Ok(update) => Some(update),
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "gamification update failed");
                None
            }
        };

        tracing::info!(
            %session_id,
            score = finalization.summary.score(),
            max_score = finalization.summary.max_score(),
            "quiz result delivered"
        );
        FinalReport {
            summary: finalization.summary.clone(),
            submission: SubmissionStatus::Submitted { receipt },
            gamification,
        }
    }
}
