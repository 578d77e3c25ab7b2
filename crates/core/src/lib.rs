#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod scoring;
pub mod time;

pub use error::Error;
pub use time::Clock;

use model::{Question, QuestionDraft, ensure_unique_ids};

/// Validate a batch of drafts, stopping at the first invalid question.
///
/// # Errors
///
/// Returns `Error::Question` for the first draft that fails validation, or
/// when two drafts share an id.
pub fn validate_questions(
    drafts: impl IntoIterator<Item = QuestionDraft>,
) -> Result<Vec<Question>, Error> {
    let questions = drafts
        .into_iter()
        .map(QuestionDraft::validate)
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique_ids(&questions)?;
    Ok(questions)
}
