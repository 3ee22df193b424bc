use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::question::{OptionKey, QuestionError};

/// What was recorded for a question: a chosen option or the timeout sentinel.
///
/// Serialized as the bare key (`"A"`..`"D"`) or `"TIMEOUT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AnswerChoice {
    Option(OptionKey),
    Timeout,
}

impl AnswerChoice {
    pub const TIMEOUT_SENTINEL: &'static str = "TIMEOUT";

    #[must_use]
    pub fn option_key(self) -> Option<OptionKey> {
        match self {
            AnswerChoice::Option(key) => Some(key),
            AnswerChoice::Timeout => None,
        }
    }
}

impl From<OptionKey> for AnswerChoice {
    fn from(key: OptionKey) -> Self {
        AnswerChoice::Option(key)
    }
}

impl fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerChoice::Option(key) => f.write_str(key.as_str()),
            AnswerChoice::Timeout => f.write_str(Self::TIMEOUT_SENTINEL),
        }
    }
}

impl From<AnswerChoice> for String {
    fn from(choice: AnswerChoice) -> Self {
        choice.to_string()
    }
}

impl TryFrom<String> for AnswerChoice {
    type Error = QuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == Self::TIMEOUT_SENTINEL {
            return Ok(AnswerChoice::Timeout);
        }
        value.parse::<OptionKey>().map(AnswerChoice::Option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_strings() {
        let json = serde_json::to_string(&[AnswerChoice::Option(OptionKey::B), AnswerChoice::Timeout])
            .unwrap();
        assert_eq!(json, r#"["B","TIMEOUT"]"#);

        let back: Vec<AnswerChoice> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[1], AnswerChoice::Timeout);
        assert!(serde_json::from_str::<AnswerChoice>(r#""E""#).is_err());
    }
}
