#![forbid(unsafe_code)]

pub mod contract;
pub mod http;
pub mod memory;

pub use contract::{
    GamificationSink, GamificationUpdate, HintSource, QuizResultMetadata, QuizSource,
    RemoteError, SubmissionPayload, SubmissionReceipt, SubmissionSink, SubmittedAnswer,
};
pub use http::{HttpRemote, RemoteConfig};
pub use memory::InMemoryRemote;
