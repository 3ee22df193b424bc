#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;
pub mod settings;

pub use quiz_core::Clock;

pub use error::{SessionError, SettingsError};
pub use settings::EngineSettings;

pub use sessions::{
    FinalReport, QuizSessionService, SessionHandle, SessionOutcome, SessionSnapshot,
    SubmissionStatus,
};
