mod answer;
mod ids;
mod phase;
mod question;
mod summary;

pub use answer::AnswerChoice;
pub use ids::{QuestionId, QuizId, SessionId};
pub use phase::{FeedbackStage, Phase};
pub use question::{Difficulty, OPTION_SLOTS, OptionKey, Question, QuestionDraft, QuestionError};
pub use summary::{QuestionResponse, ResultSummary};
