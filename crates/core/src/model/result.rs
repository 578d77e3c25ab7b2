use serde::Serialize;

use crate::model::ids::QuestionId;
use crate::scoring::{PerformanceTier, percentage};

/// How a session reached completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    Finished,
    TimedOut,
}

/// Scoring of one question at completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub answer: Option<usize>,
    pub correct_index: usize,
    pub is_correct: bool,
    pub points_awarded: u32,
    pub points_possible: u32,
}

/// Aggregate result of a completed session.
///
/// Built once at completion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    outcomes: Vec<QuestionOutcome>,
    points_earned: u64,
    points_possible: u64,
    percentage: u8,
    tier: PerformanceTier,
    elapsed_secs: u64,
    completion: CompletionReason,
}

impl QuizResult {
    #[must_use]
    pub fn from_outcomes(
        outcomes: Vec<QuestionOutcome>,
        elapsed_secs: u64,
        completion: CompletionReason,
    ) -> Self {
        let points_earned = outcomes
            .iter()
            .map(|o| u64::from(o.points_awarded))
            .sum();
        let points_possible = outcomes
            .iter()
            .map(|o| u64::from(o.points_possible))
            .sum();
        let percentage = percentage(points_earned, points_possible);

        Self {
            outcomes,
            points_earned,
            points_possible,
            percentage,
            tier: PerformanceTier::from_percentage(percentage),
            elapsed_secs,
            completion,
        }
    }

    #[must_use]
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn outcome(&self, index: usize) -> Option<&QuestionOutcome> {
        self.outcomes.get(index)
    }

    #[must_use]
    pub fn points_earned(&self) -> u64 {
        self.points_earned
    }

    #[must_use]
    pub fn points_possible(&self) -> u64 {
        self.points_possible
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn tier(&self) -> PerformanceTier {
        self.tier
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn completion(&self) -> CompletionReason {
        self.completion
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct).count()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.answer.is_some()).count()
    }

    /// Per-question correctness in question order.
    #[must_use]
    pub fn correctness(&self) -> Vec<bool> {
        self.outcomes.iter().map(|o| o.is_correct).collect()
    }

    /// Recorded answers in question order.
    #[must_use]
    pub fn answers(&self) -> Vec<Option<usize>> {
        self.outcomes.iter().map(|o| o.answer).collect()
    }
}
