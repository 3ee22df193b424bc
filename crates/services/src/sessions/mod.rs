mod countdown;
mod driver;
mod finalizer;
mod navigation;
mod progress;
mod sequencer;
mod snapshot;
mod state;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::Countdown;
pub use driver::{SessionHandle, SessionOutcome};
pub use finalizer::{FinalReport, Finalization, Finalizer, SubmissionStatus};
pub use navigation::{Advance, NavigationState, Navigator};
pub use progress::SessionProgress;
pub use sequencer::{DwellStep, FeedbackSequencer};
pub use snapshot::{OptionView, QuestionView, SessionSnapshot};
pub use state::{QuizSession, TimerOutcome};
pub use workflow::QuizSessionService;

#[cfg(test)]
pub(crate) mod test_support {
    use quiz_core::model::{Difficulty, OptionKey, Question, QuestionDraft, QuestionId};

    fn draft(id: u64, correct: OptionKey, points: u32) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Question {id}"),
            options: [
                Some("first".into()),
                Some("second".into()),
                Some("third".into()),
                None,
            ],
            correct_option_key: correct,
            explanation: Some(format!("Because {correct}")),
            hint: None,
            point_value: points,
            time_limit_seconds: 30,
            difficulty: Difficulty::Medium,
        }
    }

    /// Three options (A to C), a 30 second limit and no embedded hint.
    pub(crate) fn question(id: u64, correct: OptionKey, points: u32) -> Question {
        draft(id, correct, points).validate().unwrap()
    }

    pub(crate) fn question_with_hint(id: u64, correct: OptionKey, hint: &str) -> Question {
        let mut draft = draft(id, correct, 10);
        draft.hint = Some(hint.to_owned());
        draft.validate().unwrap()
    }
}
