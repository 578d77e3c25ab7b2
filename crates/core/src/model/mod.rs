mod config;
mod ids;
mod question;
mod result;
mod text;

pub use config::{ConfigError, DEFAULT_CRITICAL_THRESHOLD_SECS, QuizConfig, QuizConfigDraft};
pub use ids::{ParseIdError, QuestionId};
pub use question::{Difficulty, Question, QuestionDraft, QuestionError, ensure_unique_ids};
pub use result::{CompletionReason, QuestionOutcome, QuizResult};
pub use text::{Language, LocalizedText, TextError};
