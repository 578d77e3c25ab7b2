use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::text::{Language, LocalizedText};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two options, got {len}")]
    TooFewOptions { len: usize },

    #[error("option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("alternate options must match option count (expected {expected}, found {found})")]
    AlternateOptionsMismatch { expected: usize, found: usize },

    #[error("correct option {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("question points must be > 0")]
    ZeroPoints,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("question id {0} appears more than once")]
    DuplicateId(QuestionId),
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(QuestionError::UnknownDifficulty(other.to_string())),
        }
    }
}

//
// ─── QUESTION DRAFT ───────────────────────────────────────────────────────────
//

/// Unvalidated question as delivered by the content source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    #[serde(default)]
    pub prompt_alt: Option<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub options_alt: Option<Vec<String>>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub explanation_alt: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub points: u32,
}

impl QuestionDraft {
    /// Convenience constructor for a single-language question.
    #[must_use]
    pub fn new(
        id: u64,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        points: u32,
    ) -> Self {
        Self {
            id: QuestionId::new(id),
            prompt: prompt.into(),
            options,
            correct_index,
            points,
            ..Self::default()
        }
    }

    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or an option is blank, fewer than two
    /// options are given, the alternate options do not line up, the correct index
    /// is out of bounds, or the question is worth zero points.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = LocalizedText::new(self.prompt)
            .map_err(|_| QuestionError::EmptyPrompt)?
            .with_alternate(self.prompt_alt);

        let len = self.options.len();
        if len < 2 {
            return Err(QuestionError::TooFewOptions { len });
        }

        let alternates: Vec<Option<String>> = match self.options_alt {
            Some(alts) if alts.len() != len => {
                return Err(QuestionError::AlternateOptionsMismatch {
                    expected: len,
                    found: alts.len(),
                });
            }
            Some(alts) => alts.into_iter().map(Some).collect(),
            None => vec![None; len],
        };

        let options = self
            .options
            .into_iter()
            .zip(alternates)
            .enumerate()
            .map(|(index, (text, alt))| {
                LocalizedText::new(text)
                    .map(|text| text.with_alternate(alt))
                    .map_err(|_| QuestionError::EmptyOption { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.correct_index >= len {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len,
            });
        }

        if self.points == 0 {
            return Err(QuestionError::ZeroPoints);
        }

        let explanation = self
            .explanation
            .and_then(|text| LocalizedText::new(text).ok())
            .map(|text| text.with_alternate(self.explanation_alt));

        Ok(Question {
            id: self.id,
            prompt,
            options,
            correct_index: self.correct_index,
            explanation,
            difficulty: self.difficulty,
            points: self.points,
        })
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single scored multiple-choice question.
///
/// Construct through `QuestionDraft::validate`; the correct index is always in
/// bounds and `points` is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: LocalizedText,
    options: Vec<LocalizedText>,
    correct_index: usize,
    explanation: Option<LocalizedText>,
    difficulty: Difficulty,
    points: u32,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self, language: Language) -> &str {
        self.prompt.get(language)
    }

    /// Option texts in display order.
    #[must_use]
    pub fn options(&self, language: Language) -> Vec<&str> {
        self.options.iter().map(|opt| opt.get(language)).collect()
    }

    #[must_use]
    pub fn option(&self, index: usize, language: Language) -> Option<&str> {
        self.options.get(index).map(|opt| opt.get(language))
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self, language: Language) -> Option<&str> {
        self.explanation.as_ref().map(|text| text.get(language))
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Exact-match check; there is no partial credit.
    #[must_use]
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_index)
    }
}

/// Reject a question set that reuses an identifier.
///
/// # Errors
///
/// Returns `QuestionError::DuplicateId` for the first repeated id.
pub fn ensure_unique_ids(questions: &[Question]) -> Result<(), QuestionError> {
    let mut seen = HashSet::with_capacity(questions.len());
    match questions.iter().map(Question::id).find(|id| !seen.insert(*id)) {
        Some(id) => Err(QuestionError::DuplicateId(id)),
        None => Ok(()),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
