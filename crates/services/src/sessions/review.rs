use quiz_core::model::{QuestionId, QuizResult};

use super::service::{QuizSession, SessionState};
use crate::error::SessionError;

/// A completed question annotated with the learner's answer and its correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem<'a> {
    pub index: usize,
    pub question_id: QuestionId,
    pub prompt: &'a str,
    pub options: Vec<&'a str>,
    pub answer: Option<usize>,
    pub correct_index: usize,
    pub is_correct: bool,
    pub points_awarded: u32,
    pub explanation: Option<&'a str>,
}

impl QuizSession {
    /// Walk the completed questions again from the first one.
    ///
    /// Answers and the stored result are left untouched. Entering again while
    /// already reviewing restarts at the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` while the session is still in progress.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        let result = self.completed_result()?.clone();
        self.state = SessionState::Reviewing {
            position: 0,
            result,
        };
        Ok(())
    }

    /// Leave review mode. No-op if not reviewing.
    pub fn exit_review(&mut self) {
        if let SessionState::Reviewing { result, .. } = &self.state {
            self.state = SessionState::Completed {
                result: result.clone(),
            };
        }
    }

    /// Review annotation for the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` before completion and
    /// `SessionError::PositionOutOfRange` for an invalid index.
    pub fn review_item(&self, index: usize) -> Result<ReviewItem<'_>, SessionError> {
        let result = self.completed_result()?;
        let len = self.questions.len();
        let (Some(question), Some(outcome)) = (self.questions.get(index), result.outcome(index))
        else {
            return Err(SessionError::PositionOutOfRange { index, len });
        };

        let language = self.config.language();
        Ok(ReviewItem {
            index,
            question_id: question.id(),
            prompt: question.prompt(language),
            options: question.options(language),
            answer: outcome.answer,
            correct_index: outcome.correct_index,
            is_correct: outcome.is_correct,
            points_awarded: outcome.points_awarded,
            explanation: question.explanation(language),
        })
    }

    /// Review annotation for the current review position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` before completion.
    pub fn current_review_item(&self) -> Result<ReviewItem<'_>, SessionError> {
        self.review_item(self.position())
    }

    /// Review annotations for every question, in order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` before completion.
    pub fn review_items(&self) -> Result<Vec<ReviewItem<'_>>, SessionError> {
        (0..self.questions.len())
            .map(|index| self.review_item(index))
            .collect()
    }

    fn completed_result(&self) -> Result<&QuizResult, SessionError> {
        self.result().ok_or(SessionError::NotCompleted)
    }
}
