use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Timing knobs of the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Pause that shows a manual selection before its verdict.
    pub reveal_dwell_ms: u64,
    /// How long the verdict stays up before the automatic advance.
    pub feedback_dwell_ms: u64,
    /// Display refresh cadence of the countdown.
    pub tick_interval_ms: u64,
    pub default_question_count: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reveal_dwell_ms: 800,
            feedback_dwell_ms: 2_500,
            tick_interval_ms: 250,
            default_question_count: 10,
        }
    }
}

impl EngineSettings {
    /// Load settings from defaults, `config/quiz.toml` (optional) and `QUIZ__*` env vars.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a source cannot be parsed or a value is zero.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name("config/quiz").required(false))
            .add_source(Environment::with_prefix("QUIZ").separator("__"))
            .build()?
            .try_deserialize::<Self>()?;
        settings.validate()
    }

    /// Parse settings from a TOML document layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the document is invalid or a value is zero.
    pub fn from_toml_str(toml: &str) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?;
        settings.validate()
    }

    fn validate(self) -> Result<Self, SettingsError> {
        if self.reveal_dwell_ms == 0 {
            return Err(SettingsError::Zero {
                field: "reveal_dwell_ms",
            });
        }
        if self.feedback_dwell_ms == 0 {
            return Err(SettingsError::Zero {
                field: "feedback_dwell_ms",
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Zero {
                field: "tick_interval_ms",
            });
        }
        if self.default_question_count == 0 {
            return Err(SettingsError::Zero {
                field: "default_question_count",
            });
        }
        Ok(self)
    }

    #[must_use]
    pub fn reveal_dwell(&self) -> Duration {
        Duration::from_millis(self.reveal_dwell_ms)
    }

    #[must_use]
    pub fn feedback_dwell(&self) -> Duration {
        Duration::from_millis(self.feedback_dwell_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
