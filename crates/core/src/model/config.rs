use serde::Deserialize;
use thiserror::Error;

use crate::model::text::Language;

/// Remaining time at or below which a timed quiz is flagged as critical.
pub const DEFAULT_CRITICAL_THRESHOLD_SECS: u32 = 60;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("critical threshold must be > 0 seconds")]
    InvalidCriticalThreshold,
    #[error("invalid quiz configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Validated quiz options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    time_limit_secs: Option<u32>,
    language: Language,
    critical_threshold_secs: u32,
}

/// Raw configuration bag as handed over by the embedding page.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfigDraft {
    #[serde(default)]
    pub time_limit_seconds: Option<u32>,
    #[serde(default)]
    pub alternate_language_display: bool,
    #[serde(default)]
    pub critical_threshold_seconds: Option<u32>,
}

impl QuizConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration bag. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the input is not a valid config object.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Validate and normalize the draft.
    ///
    /// A time limit of zero means untimed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCriticalThreshold` for an explicit zero threshold.
    pub fn validate(self) -> Result<QuizConfig, ConfigError> {
        let time_limit_secs = self.time_limit_seconds.filter(|secs| *secs > 0);
        let critical_threshold_secs = match self.critical_threshold_seconds {
            Some(0) => return Err(ConfigError::InvalidCriticalThreshold),
            Some(secs) => secs,
            None => DEFAULT_CRITICAL_THRESHOLD_SECS,
        };

        Ok(QuizConfig {
            time_limit_secs,
            language: Language::from_alternate_flag(self.alternate_language_display),
            critical_threshold_secs,
        })
    }
}

impl QuizConfig {
    #[must_use]
    pub fn untimed() -> Self {
        Self::default()
    }

    /// Timed quiz; `0` is treated as untimed.
    #[must_use]
    pub fn timed(secs: u32) -> Self {
        Self {
            time_limit_secs: Some(secs).filter(|secs| *secs > 0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_alternate_language(mut self, alternate: bool) -> Self {
        self.language = Language::from_alternate_flag(alternate);
        self
    }

    /// Threshold of zero is ignored.
    #[must_use]
    pub fn with_critical_threshold(mut self, secs: u32) -> Self {
        if secs > 0 {
            self.critical_threshold_secs = secs;
        }
        self
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit_secs.is_some()
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn critical_threshold_secs(&self) -> u32 {
        self.critical_threshold_secs
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: None,
            language: Language::Primary,
            critical_threshold_secs: DEFAULT_CRITICAL_THRESHOLD_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bag_is_untimed() {
        let config = QuizConfigDraft::from_json("{}").unwrap().validate().unwrap();
        assert_eq!(config, QuizConfig::untimed());
        assert!(!config.is_timed());
        assert_eq!(config.language(), Language::Primary);
    }

    #[test]
    fn zero_time_limit_is_untimed() {
        let config = QuizConfigDraft::from_json(r#"{"timeLimitSeconds": 0}"#)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(config.time_limit_secs(), None);
        assert_eq!(QuizConfig::timed(0).time_limit_secs(), None);
    }

    #[test]
    fn full_bag_parses() {
        let config = QuizConfigDraft::from_json(
            r#"{"timeLimitSeconds": 300, "alternateLanguageDisplay": true, "criticalThresholdSeconds": 30, "theme": "dark"}"#,
        )
        .unwrap()
        .validate()
        .unwrap();
        assert_eq!(config.time_limit_secs(), Some(300));
        assert_eq!(config.language(), Language::Alternate);
        assert_eq!(config.critical_threshold_secs(), 30);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let draft = QuizConfigDraft {
            critical_threshold_seconds: Some(0),
            ..QuizConfigDraft::new()
        };
        assert!(matches!(
            draft.validate(),
            Err(ConfigError::InvalidCriticalThreshold)
        ));
    }

    #[test]
    fn malformed_bag_is_a_parse_error() {
        let err = QuizConfigDraft::from_json(r#"{"timeLimitSeconds": -5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
