#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;

pub use sessions::{
    CompletionEvent, QuestionView, QuizLoopService, QuizRun, QuizSession, ResultView, ReviewItem,
    SessionProgress, SessionTimer, Step, TickOutcome, TimerTick,
};
