use serde::Serialize;

use quiz_core::model::{CompletionReason, Difficulty, QuestionId, QuizResult};
use quiz_core::time::format_clock;

use super::service::QuizSession;

/// Display snapshot of the current in-progress question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub index: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub points: u32,
    pub difficulty: Difficulty,
    /// Present only after the explanation was revealed.
    pub explanation: Option<String>,
    pub remaining_label: Option<String>,
    pub time_critical: bool,
    pub is_last: bool,
}

impl QuestionView {
    /// Snapshot the question at the session's current position.
    ///
    /// Returns `None` once the session is completed and not being reviewed.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        let question = session.current_question()?;
        let language = session.language();
        let index = session.position();
        let total = session.total_questions();

        Some(Self {
            question_id: question.id(),
            index,
            total,
            prompt: question.prompt(language).to_string(),
            options: question
                .options(language)
                .into_iter()
                .map(str::to_string)
                .collect(),
            selected: session.answer(index),
            points: question.points(),
            difficulty: question.difficulty(),
            explanation: session
                .explanation_shown()
                .then(|| question.explanation(language).map(str::to_string))
                .flatten(),
            remaining_label: session.remaining_label(),
            time_critical: session.is_time_critical(),
            is_last: index + 1 == total,
        })
    }
}

/// Display snapshot of a completed session's score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub earned: u64,
    pub possible: u64,
    pub percentage: u8,
    pub tier_label: &'static str,
    pub correct: usize,
    pub total: usize,
    pub elapsed_label: String,
    pub timed_out: bool,
}

impl From<&QuizResult> for ResultView {
    fn from(result: &QuizResult) -> Self {
        Self {
            earned: result.points_earned(),
            possible: result.points_possible(),
            percentage: result.percentage(),
            tier_label: result.tier().label(),
            correct: result.correct_count(),
            total: result.question_count(),
            elapsed_label: format_clock(result.elapsed_secs()),
            timed_out: result.completion() == CompletionReason::TimedOut,
        }
    }
}
