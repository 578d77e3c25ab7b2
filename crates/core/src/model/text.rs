use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("text must not be empty")]
    Empty,
}

/// Which language variant of a piece of content is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Primary,
    Alternate,
}

impl Language {
    #[must_use]
    pub fn from_alternate_flag(alternate: bool) -> Self {
        if alternate {
            Self::Alternate
        } else {
            Self::Primary
        }
    }
}

/// Text with an optional alternate-language variant.
///
/// Asking for the alternate variant falls back to the primary text when no
/// translation exists, so callers never render an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    primary: String,
    alternate: Option<String>,
}

impl LocalizedText {
    /// # Errors
    ///
    /// Returns `TextError::Empty` if `primary` is blank.
    pub fn new(primary: impl Into<String>) -> Result<Self, TextError> {
        let primary = primary.into();
        if primary.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self {
            primary,
            alternate: None,
        })
    }

    /// Attach an alternate variant. Blank input leaves the text without one.
    #[must_use]
    pub fn with_alternate(mut self, alternate: Option<String>) -> Self {
        self.alternate = alternate.filter(|alt| !alt.trim().is_empty());
        self
    }

    #[must_use]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    #[must_use]
    pub fn alternate(&self) -> Option<&str> {
        self.alternate.as_deref()
    }

    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Primary => &self.primary,
            Language::Alternate => self.alternate.as_deref().unwrap_or(&self.primary),
        }
    }
}
