//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{OptionKey, Phase, QuestionId};
use quiz_remote::RemoteError;

/// Errors emitted by quiz session operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{operation} is not allowed while the session is {phase}")]
    IllegalTransition {
        operation: &'static str,
        phase: Phase,
    },
    #[error("question {got} is not the active question (expected {expected})")]
    NotCurrentQuestion {
        expected: QuestionId,
        got: QuestionId,
    },
    #[error("question {question_id} has no option {key}")]
    UnknownOption {
        question_id: QuestionId,
        key: OptionKey,
    },
    #[error("question {0} already has a recorded answer")]
    AlreadyAnswered(QuestionId),
    #[error("hint for question {0} was already used")]
    HintAlreadyUsed(QuestionId),
    #[error("no hint available for question {0}")]
    NoHintAvailable(QuestionId),
    #[error("cannot {operation}: no reachable question in that direction")]
    NavigationBlocked { operation: &'static str },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("no questions available for this quiz")]
    EmptyQuizData,
    #[error("quiz submission failed: {0}")]
    SubmissionFailure(#[source] RemoteError),
    #[error("session is closed")]
    SessionClosed,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted while loading engine settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
