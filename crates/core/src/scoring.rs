use std::fmt;

use serde::Serialize;

use crate::model::{CompletionReason, Question, QuestionOutcome, QuizResult};

//
// ─── PERCENTAGE ───────────────────────────────────────────────────────────────
//

/// `round(earned / possible * 100)`, rounding halves up.
///
/// Returns `0` when nothing was possible.
///
/// # Examples
///
/// ```
/// # use quiz_core::scoring::percentage;
/// assert_eq!(percentage(20, 40), 50);
/// assert_eq!(percentage(1, 3), 33);
/// assert_eq!(percentage(2, 3), 67);
/// assert_eq!(percentage(0, 0), 0);
/// ```
#[must_use]
pub fn percentage(earned: u64, possible: u64) -> u8 {
    if possible == 0 {
        return 0;
    }
    let earned = u128::from(earned.min(possible));
    let possible = u128::from(possible);
    let rounded = (earned * 200 + possible) / (possible * 2);
    u8::try_from(rounded).unwrap_or(100)
}

//
// ─── PERFORMANCE TIER ─────────────────────────────────────────────────────────
//

/// Coarse qualitative bucket for a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    NeedsPractice,
    Fair,
    Good,
    Excellent,
}

impl PerformanceTier {
    /// Lower bounds, highest first. A score exactly on a bound takes that tier.
    pub const THRESHOLDS: [(u8, PerformanceTier); 3] = [
        (90, PerformanceTier::Excellent),
        (70, PerformanceTier::Good),
        (50, PerformanceTier::Fair),
    ];

    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(min, _)| percentage >= *min)
            .map_or(PerformanceTier::NeedsPractice, |(_, tier)| *tier)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Fair => "fair",
            PerformanceTier::NeedsPractice => "needs practice",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── SCORING ──────────────────────────────────────────────────────────────────
//

/// Score one question: full points on an exact match, zero otherwise.
#[must_use]
pub fn score_question(question: &Question, answer: Option<usize>) -> QuestionOutcome {
    let is_correct = question.is_correct(answer);
    QuestionOutcome {
        question_id: question.id(),
        answer,
        correct_index: question.correct_index(),
        is_correct,
        points_awarded: if is_correct { question.points() } else { 0 },
        points_possible: question.points(),
    }
}

/// Score a full answer sheet.
///
/// `answers` is matched to `questions` by position; missing slots count as
/// unanswered.
#[must_use]
pub fn score_answers(
    questions: &[Question],
    answers: &[Option<usize>],
    elapsed_secs: u64,
    completion: CompletionReason,
) -> QuizResult {
    let outcomes = questions
        .iter()
        .enumerate()
        .map(|(idx, question)| score_question(question, answers.get(idx).copied().flatten()))
        .collect();
    QuizResult::from_outcomes(outcomes, elapsed_secs, completion)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;

    fn question(id: u64, correct: usize, points: u32) -> Question {
        let options = ["a", "b", "c", "d"].iter().map(|s| (*s).to_string()).collect();
        QuestionDraft::new(id, format!("Q{id}"), options, correct, points)
            .validate()
            .unwrap()
    }

    fn sample_set() -> Vec<Question> {
        vec![question(1, 1, 10), question(2, 0, 20), question(3, 2, 10)]
    }

    #[test]
    fn mixed_answers_score_example() {
        let result = score_answers(
            &sample_set(),
            &[Some(1), Some(2), Some(2)],
            0,
            CompletionReason::Finished,
        );
        assert_eq!(result.points_earned(), 20);
        assert_eq!(result.points_possible(), 40);
        assert_eq!(result.percentage(), 50);
        assert_eq!(result.tier(), PerformanceTier::Fair);
        assert_eq!(result.correctness(), vec![true, false, true]);
    }

    #[test]
    fn near_miss_scores_zero() {
        let q = question(1, 2, 10);
        for answer in [Some(0), Some(1), Some(3), None] {
            assert_eq!(score_question(&q, answer).points_awarded, 0);
        }
        assert_eq!(score_question(&q, Some(2)).points_awarded, 10);
    }

    #[test]
    fn scoring_is_deterministic() {
        let questions = sample_set();
        let answers = [Some(1), None, Some(2)];
        let first = score_answers(&questions, &answers, 5, CompletionReason::Finished);
        let second = score_answers(&questions, &answers, 5, CompletionReason::Finished);
        assert_eq!(first, second);
    }

    #[test]
    fn short_answer_sheet_counts_as_unanswered() {
        let result = score_answers(&sample_set(), &[Some(1)], 0, CompletionReason::TimedOut);
        assert_eq!(result.points_earned(), 10);
        assert_eq!(result.answered_count(), 1);
    }

    #[test]
    fn zero_possible_is_zero_percent() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 200), 1); // 0.5
        assert_eq!(percentage(40, 40), 100);
    }

    #[test]
    fn tier_boundaries_go_to_higher_tier() {
        assert_eq!(PerformanceTier::from_percentage(100), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_percentage(90), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_percentage(89), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percentage(70), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percentage(69), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_percentage(50), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_percentage(49), PerformanceTier::NeedsPractice);
        assert_eq!(PerformanceTier::from_percentage(0), PerformanceTier::NeedsPractice);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(PerformanceTier::NeedsPractice.to_string(), "needs practice");
        assert!(PerformanceTier::Excellent > PerformanceTier::Good);
    }
}
