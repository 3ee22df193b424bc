use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Number of option slots a question carries. Slots may be empty.
pub const OPTION_SLOTS: usize = 4;

//
// ─── OPTION KEY ────────────────────────────────────────────────────────────────
//

/// Key addressing one option slot (`A` is slot 0, `D` is slot 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; OPTION_SLOTS] =
        [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    #[must_use]
    pub fn slot(self) -> usize {
        match self {
            OptionKey::A => 0,
            OptionKey::B => 1,
            OptionKey::C => 2,
            OptionKey::D => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            other => Err(QuestionError::UnknownOptionKey(other.to_owned())),
        }
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question has no populated option slots")]
    NoOptions,

    #[error("correct option {0} points at an empty slot")]
    CorrectOptionMissing(OptionKey),

    #[error("question time limit must be greater than zero")]
    ZeroTimeLimit,

    #[error("unknown option key: {0}")]
    UnknownOptionKey(String),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as delivered by a quiz source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: [Option<String>; OPTION_SLOTS],
    pub correct_option_key: OptionKey,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    pub point_value: u32,
    pub time_limit_seconds: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, no option slot is populated,
    /// the correct key addresses an empty slot, or the time limit is zero.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let options = self.options.map(|slot| {
            slot.map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty())
        });
        if options.iter().all(Option::is_none) {
            return Err(QuestionError::NoOptions);
        }
        if options[self.correct_option_key.slot()].is_none() {
            return Err(QuestionError::CorrectOptionMissing(self.correct_option_key));
        }
        if self.time_limit_seconds == 0 {
            return Err(QuestionError::ZeroTimeLimit);
        }

        Ok(Question {
            id: self.id,
            prompt: prompt.to_owned(),
            options,
            correct_option_key: self.correct_option_key,
            explanation: self.explanation.filter(|text| !text.trim().is_empty()),
            hint: self.hint.filter(|text| !text.trim().is_empty()),
            point_value: self.point_value,
            time_limit_seconds: self.time_limit_seconds,
            difficulty: self.difficulty,
        })
    }
}

/// A single timed multiple-choice question. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: [Option<String>; OPTION_SLOTS],
    correct_option_key: OptionKey,
    explanation: Option<String>,
    hint: Option<String>,
    point_value: u32,
    time_limit_seconds: u32,
    difficulty: Difficulty,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Text of the option behind `key`, if that slot is populated.
    #[must_use]
    pub fn option(&self, key: OptionKey) -> Option<&str> {
        self.options[key.slot()].as_deref()
    }

    /// Populated slots in key order.
    pub fn available_options(&self) -> impl Iterator<Item = (OptionKey, &str)> {
        OptionKey::ALL
            .into_iter()
            .filter_map(|key| self.option(key).map(|text| (key, text)))
    }

    #[must_use]
    pub fn correct_option_key(&self) -> OptionKey {
        self.correct_option_key
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn point_value(&self) -> u32 {
        self.point_value
    }

    #[must_use]
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_seconds
    }

    #[must_use]
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.time_limit_seconds))
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

impl<'de> Deserialize<'de> for Question {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        QuestionDraft::deserialize(deserializer)?
            .validate()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(1),
            prompt: "  2 + 2 = ?  ".into(),
            options: [
                Some("3".into()),
                Some("4".into()),
                None,
                Some("  ".into()),
            ],
            correct_option_key: OptionKey::B,
            explanation: None,
            hint: Some("even".into()),
            point_value: 10,
            time_limit_seconds: 30,
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn validate_trims_and_drops_blank_slots() {
        let question = draft().validate().unwrap();
        assert_eq!(question.prompt(), "2 + 2 = ?");
        assert_eq!(question.option(OptionKey::D), None);
        let keys: Vec<_> = question.available_options().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![OptionKey::A, OptionKey::B]);
        assert_eq!(question.time_limit(), Duration::from_secs(30));
    }

    #[test]
    fn correct_key_must_address_populated_slot() {
        let mut bad = draft();
        bad.correct_option_key = OptionKey::C;
        assert_eq!(
            bad.validate().unwrap_err(),
            QuestionError::CorrectOptionMissing(OptionKey::C)
        );
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let mut bad = draft();
        bad.time_limit_seconds = 0;
        assert_eq!(bad.validate().unwrap_err(), QuestionError::ZeroTimeLimit);
    }

    #[test]
    fn empty_question_is_rejected() {
        let mut bad = draft();
        bad.options = [None, None, None, None];
        assert_eq!(bad.validate().unwrap_err(), QuestionError::NoOptions);

        let mut blank = draft();
        blank.prompt = "   ".into();
        assert_eq!(blank.validate().unwrap_err(), QuestionError::EmptyPrompt);
    }

    #[test]
    fn option_key_parsing_is_exact() {
        assert_eq!("C".parse::<OptionKey>().unwrap(), OptionKey::C);
        assert!("c".parse::<OptionKey>().is_err());
        assert_eq!(OptionKey::ALL[OptionKey::D.slot()], OptionKey::D);
    }

    #[test]
    fn deserializing_validates() {
        let json = r#"{
            "id": 9,
            "prompt": "Capital of France?",
            "options": ["Paris", "Rome", null, null],
            "correct_option_key": "A",
            "point_value": 5,
            "time_limit_seconds": 20,
            "difficulty": "hard"
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.id(), QuestionId::new(9));
        assert_eq!(question.difficulty(), Difficulty::Hard);

        let broken = json.replace("\"A\"", "\"C\"");
        assert!(serde_json::from_str::<Question>(&broken).is_err());
    }
}
