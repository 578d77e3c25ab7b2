mod progress;
mod review;
mod service;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use review::ReviewItem;
pub use service::{QuizSession, Step, TickOutcome};
pub use timer::{SessionTimer, TimerTick};
pub use view::{QuestionView, ResultView};
pub use workflow::{CompletionCallback, CompletionEvent, QuizLoopService, QuizRun};
