use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerChoice, Question, QuestionId, QuizId, ResultSummary, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by remote collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("not found")]
    NotFound,

    #[error("rejected by remote: {0}")]
    Rejected(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("remote returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

//
// ─── PAYLOADS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub answer: AnswerChoice,
    pub response_time_ms: u64,
}

/// Everything the scoring service needs to grade an attempt.
///
/// Built once from the finished session so a retry sends the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub session_id: SessionId,
    pub quiz_id: QuizId,
    pub answers: Vec<SubmittedAnswer>,
    pub time_taken_seconds: u64,
    pub hints_used: Vec<QuestionId>,
}

/// Scoring service response. Every field is optional; the remote may return partial data.
///
/// `hint_penalty`, `time_bonus` and `final_score` are server-side adjustments the engine
/// only displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub max_score: Option<u64>,
    #[serde(default)]
    pub percentage: Option<u8>,
    #[serde(default)]
    pub hint_penalty: Option<u64>,
    #[serde(default)]
    pub time_bonus: Option<u64>,
    #[serde(default)]
    pub final_score: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResultMetadata {
    pub session_id: SessionId,
    pub quiz_id: QuizId,
    pub hints_used: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub server_score: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationUpdate {
    #[serde(default)]
    pub new_streak: Option<u32>,
    #[serde(default)]
    pub total_points: Option<u64>,
    #[serde(default)]
    pub achievements_unlocked: Vec<String>,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch up to `question_count` questions for a quiz, in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the quiz cannot be loaded. An empty list is not an error
    /// at this layer.
    async fn fetch_quiz(
        &self,
        quiz_id: QuizId,
        question_count: usize,
    ) -> Result<Vec<Question>, RemoteError>;
}

#[async_trait]
pub trait HintSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` when the question has no hint.
    async fn fetch_hint(&self, question_id: QuestionId) -> Result<String, RemoteError>;
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` when the scoring service rejects or cannot be reached.
    async fn submit_quiz(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, RemoteError>;
}

#[async_trait]
pub trait GamificationSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` on any failure; callers treat this as best effort.
    async fn record_quiz_result(
        &self,
        summary: &ResultSummary,
        metadata: &QuizResultMetadata,
    ) -> Result<GamificationUpdate, RemoteError>;
}
