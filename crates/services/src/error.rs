//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ConfigError, QuestionError};

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("session is not completed yet")]
    NotCompleted,
    #[error("option {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("question {index} is out of range for {len} questions")]
    PositionOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
