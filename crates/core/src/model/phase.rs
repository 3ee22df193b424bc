use serde::{Deserialize, Serialize};
use std::fmt;

/// Sub-stage of the feedback phase.
///
/// `Reveal` is the short pause that shows the student's own selection before the
/// verdict appears; it only follows a manual selection. `Verdict` shows correctness
/// and ends with the automatic advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackStage {
    Reveal,
    Verdict,
}

/// Discrete state of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "stage", rename_all = "kebab-case")]
pub enum Phase {
    NotStarted,
    InProgress,
    Feedback(FeedbackStage),
    Finished,
}

impl Phase {
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(self, Phase::InProgress)
    }

    #[must_use]
    pub fn is_feedback(self) -> bool {
        matches!(self, Phase::Feedback(_))
    }

    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Finished)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::NotStarted => "not-started",
            Phase::InProgress => "in-progress",
            Phase::Feedback(FeedbackStage::Reveal) => "feedback(reveal)",
            Phase::Feedback(FeedbackStage::Verdict) => "feedback(verdict)",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
