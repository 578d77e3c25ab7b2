use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{
    CompletionReason, Language, Question, QuestionDraft, QuizConfig, QuizResult, ensure_unique_ids,
};
use quiz_core::scoring::score_answers;
use quiz_core::time::{Countdown, CountdownTick, elapsed_secs};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a session.
///
/// Answers only exist while in progress; after completion they live inside the
/// frozen `QuizResult`, so there is nothing left to mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SessionState {
    InProgress {
        position: usize,
        answers: Vec<Option<usize>>,
        explanation_shown: bool,
    },
    Completed {
        result: QuizResult,
    },
    Reviewing {
        position: usize,
        result: QuizResult,
    },
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved { position: usize },
    /// Boundary reached or nothing to navigate; not an error.
    Stayed,
    /// Moving past the last question completed the session.
    Completed,
}

/// Outcome of a one-second timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    /// The budget ran out on this tick and the session was completed.
    Expired,
    /// Untimed, already completed, or stopped. Late ticks land here.
    Ignored,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a fixed question sequence.
///
/// Timestamps come from the caller's clock so that the session itself stays
/// deterministic.
pub struct QuizSession {
    pub(super) questions: Vec<Question>,
    pub(super) config: QuizConfig,
    pub(super) started_at: DateTime<Utc>,
    pub(super) countdown: Option<Countdown>,
    pub(super) state: SessionState,
}

impl QuizSession {
    /// Start a session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided and
    /// `SessionError::Question` if two questions share an id.
    pub fn new(
        questions: Vec<Question>,
        config: QuizConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        ensure_unique_ids(&questions)?;

        let countdown = config
            .time_limit_secs()
            .and_then(|secs| Countdown::new(secs, config.critical_threshold_secs()));

        Ok(Self {
            state: SessionState::InProgress {
                position: 0,
                answers: vec![None; questions.len()],
                explanation_shown: false,
            },
            questions,
            config,
            started_at,
            countdown,
        })
    }

    /// Validate drafts and start a session over them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Question` for the first invalid draft or a
    /// repeated id, and `SessionError::Empty` if there are none.
    pub fn from_drafts(
        drafts: Vec<QuestionDraft>,
        config: QuizConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions, config, started_at)
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.config.language()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Current index for both answering and review.
    #[must_use]
    pub fn position(&self) -> usize {
        match &self.state {
            SessionState::InProgress { position, .. } | SessionState::Reviewing { position, .. } => {
                *position
            }
            SessionState::Completed { .. } => 0,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            SessionState::Completed { .. } => None,
            _ => self.questions.get(self.position()),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !matches!(self.state, SessionState::InProgress { .. })
    }

    #[must_use]
    pub fn is_reviewing(&self) -> bool {
        matches!(self.state, SessionState::Reviewing { .. })
    }

    /// Returns the frozen result once the session is completed.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.state {
            SessionState::InProgress { .. } => None,
            SessionState::Completed { result } | SessionState::Reviewing { result, .. } => {
                Some(result)
            }
        }
    }

    /// Recorded answer for the question at `index`.
    #[must_use]
    pub fn answer(&self, index: usize) -> Option<usize> {
        match &self.state {
            SessionState::InProgress { answers, .. } => answers.get(index).copied().flatten(),
            SessionState::Completed { result } | SessionState::Reviewing { result, .. } => {
                result.outcome(index).and_then(|outcome| outcome.answer)
            }
        }
    }

    #[must_use]
    pub fn answers(&self) -> Vec<Option<usize>> {
        match &self.state {
            SessionState::InProgress { answers, .. } => answers.clone(),
            SessionState::Completed { result } | SessionState::Reviewing { result, .. } => {
                result.answers()
            }
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total_questions();
        let answered = self.answers().iter().filter(|a| a.is_some()).count();
        SessionProgress {
            total,
            answered,
            unanswered: total - answered,
            position: self.position(),
            is_complete: self.is_complete(),
        }
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Record `option` for the current question. Re-selecting overwrites.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is completed or in
    /// review, and `SessionError::OptionOutOfRange` for an unknown option.
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        let SessionState::InProgress {
            position, answers, ..
        } = &mut self.state
        else {
            return Err(SessionError::Completed);
        };

        let len = self.questions[*position].option_count();
        if option >= len {
            return Err(SessionError::OptionOutOfRange { index: option, len });
        }
        answers[*position] = Some(option);
        Ok(())
    }

    /// Reset the current question to unanswered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is completed or in review.
    pub fn clear_answer(&mut self) -> Result<(), SessionError> {
        let SessionState::InProgress {
            position, answers, ..
        } = &mut self.state
        else {
            return Err(SessionError::Completed);
        };
        answers[*position] = None;
        Ok(())
    }

    /// Flag the current question's explanation as visible.
    ///
    /// Returns `false` when there is no in-progress question to flag.
    pub fn show_explanation(&mut self) -> bool {
        match &mut self.state {
            SessionState::InProgress {
                explanation_shown, ..
            } => {
                *explanation_shown = true;
                true
            }
            _ => false,
        }
    }

    /// Whether the explanation of the current question should be displayed.
    /// Always true during review.
    #[must_use]
    pub fn explanation_shown(&self) -> bool {
        match &self.state {
            SessionState::InProgress {
                explanation_shown, ..
            } => *explanation_shown,
            SessionState::Reviewing { .. } => true,
            SessionState::Completed { .. } => false,
        }
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Advance to the next question.
    ///
    /// On the last in-progress question this completes the session.
    pub fn next(&mut self, now: DateTime<Utc>) -> Step {
        let last = self.questions.len() - 1;
        match &mut self.state {
            SessionState::InProgress {
                position,
                explanation_shown,
                ..
            } => {
                if *position < last {
                    *position += 1;
                    *explanation_shown = false;
                    Step::Moved {
                        position: *position,
                    }
                } else {
                    self.finalize(now, CompletionReason::Finished);
                    Step::Completed
                }
            }
            SessionState::Reviewing { position, .. } if *position < last => {
                *position += 1;
                Step::Moved {
                    position: *position,
                }
            }
            SessionState::Reviewing { .. } | SessionState::Completed { .. } => Step::Stayed,
        }
    }

    /// Go back one question. No-op at the first question.
    pub fn previous(&mut self) -> Step {
        match &mut self.state {
            SessionState::InProgress {
                position,
                explanation_shown,
                ..
            } if *position > 0 => {
                *position -= 1;
                *explanation_shown = false;
                Step::Moved {
                    position: *position,
                }
            }
            SessionState::Reviewing { position, .. } if *position > 0 => {
                *position -= 1;
                Step::Moved {
                    position: *position,
                }
            }
            _ => Step::Stayed,
        }
    }

    /// Jump directly to `index` while answering or reviewing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PositionOutOfRange` for an invalid index and
    /// `SessionError::Completed` when completed but not reviewing.
    pub fn go_to(&mut self, index: usize) -> Result<Step, SessionError> {
        let len = self.questions.len();
        if index >= len {
            return Err(SessionError::PositionOutOfRange { index, len });
        }
        match &mut self.state {
            SessionState::InProgress {
                position,
                explanation_shown,
                ..
            } => {
                if *position != index {
                    *explanation_shown = false;
                }
                *position = index;
            }
            SessionState::Reviewing { position, .. } => *position = index,
            SessionState::Completed { .. } => return Err(SessionError::Completed),
        }
        Ok(Step::Moved { position: index })
    }

    //
    // ─── TIMER ─────────────────────────────────────────────────────────────────
    //

    /// Apply one second of the time budget.
    ///
    /// When the budget runs out the session completes with whatever answers are
    /// recorded. Ticks on untimed or completed sessions are ignored.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.is_complete() {
            return TickOutcome::Ignored;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return TickOutcome::Ignored;
        };
        let tick = countdown.tick();
        self.apply_countdown(tick, now)
    }

    /// Catch the countdown up to `elapsed_secs` consumed in total.
    ///
    /// Used when ticks were missed; stale readings leave the countdown as is.
    pub fn sync_elapsed(&mut self, elapsed_secs: u32, now: DateTime<Utc>) -> TickOutcome {
        if self.is_complete() {
            return TickOutcome::Ignored;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return TickOutcome::Ignored;
        };
        let tick = countdown.advance_to(elapsed_secs);
        self.apply_countdown(tick, now)
    }

    fn apply_countdown(&mut self, tick: CountdownTick, now: DateTime<Utc>) -> TickOutcome {
        match tick {
            CountdownTick::Running { remaining_secs } => TickOutcome::Running { remaining_secs },
            CountdownTick::Expired => {
                self.finalize(now, CompletionReason::TimedOut);
                TickOutcome::Expired
            }
            CountdownTick::Stopped => TickOutcome::Ignored,
        }
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.countdown.is_some()
    }

    /// Seconds of the budget consumed so far. `None` when untimed.
    #[must_use]
    pub fn consumed_secs(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::elapsed_secs)
    }

    /// Remaining seconds, frozen once completed. `None` when untimed.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining_secs)
    }

    /// Remaining time as `m:ss`. `None` when untimed.
    #[must_use]
    pub fn remaining_label(&self) -> Option<String> {
        self.countdown.as_ref().map(Countdown::label)
    }

    /// True while the running countdown is at or below the critical threshold.
    #[must_use]
    pub fn is_time_critical(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_critical)
    }

    //
    // ─── COMPLETION ────────────────────────────────────────────────────────────
    //

    /// Score the session, or return the stored result if already completed.
    pub fn complete(&mut self, now: DateTime<Utc>) -> QuizResult {
        self.finalize(now, CompletionReason::Finished)
    }

    fn finalize(&mut self, now: DateTime<Utc>, reason: CompletionReason) -> QuizResult {
        match &self.state {
            SessionState::Completed { result } | SessionState::Reviewing { result, .. } => {
                result.clone()
            }
            SessionState::InProgress { answers, .. } => {
                let elapsed = match self.countdown.as_mut() {
                    Some(countdown) => {
                        countdown.stop();
                        u64::from(countdown.elapsed_secs())
                    }
                    None => elapsed_secs(self.started_at, now),
                };
                let result = score_answers(&self.questions, answers, elapsed, reason);
                self.state = SessionState::Completed {
                    result: result.clone(),
                };
                result
            }
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("position", &self.position())
            .field("is_complete", &self.is_complete())
            .field("is_reviewing", &self.is_reviewing())
            .field("remaining_secs", &self.remaining_secs())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
