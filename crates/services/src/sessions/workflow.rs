use std::fmt;

use quiz_core::model::{Question, QuestionDraft, QuizConfig, QuizConfigDraft, QuizResult};

use super::service::{QuizSession, Step, TickOutcome};
use super::timer::{SessionTimer, TimerTick};
use crate::Clock;
use crate::error::SessionError;

/// Payload handed to the completion callback, exactly once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub points_earned: u64,
    pub points_possible: u64,
    pub question_count: usize,
    pub result: QuizResult,
}

impl From<&QuizResult> for CompletionEvent {
    fn from(result: &QuizResult) -> Self {
        Self {
            points_earned: result.points_earned(),
            points_possible: result.points_possible(),
            question_count: result.question_count(),
            result: result.clone(),
        }
    }
}

pub type CompletionCallback = Box<dyn FnOnce(CompletionEvent) + Send>;

/// Starts quiz runs against a shared clock.
#[derive(Clone, Debug, Default)]
pub struct QuizLoopService {
    clock: Clock,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    /// Start a run over already-validated questions.
    ///
    /// The countdown is not driven until `QuizRun::start_timer` is called or
    /// ticks are fed through `QuizRun::on_tick`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn start(&self, questions: Vec<Question>, config: QuizConfig) -> Result<QuizRun, SessionError> {
        let session = QuizSession::new(questions, config, self.clock.now())?;
        Ok(self.begin(session))
    }

    /// Validate drafts and start a run over them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Question` for an invalid draft and
    /// `SessionError::Empty` if there are none.
    pub fn start_from_drafts(
        &self,
        drafts: Vec<QuestionDraft>,
        config: QuizConfig,
    ) -> Result<QuizRun, SessionError> {
        let session = QuizSession::from_drafts(drafts, config, self.clock.now())?;
        Ok(self.begin(session))
    }

    /// Start a run configured from the page's JSON options bag.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` for a malformed or invalid bag and
    /// `SessionError::Empty` if `questions` is empty.
    pub fn start_with_config_bag(
        &self,
        questions: Vec<Question>,
        config_bag: &str,
    ) -> Result<QuizRun, SessionError> {
        let config = QuizConfigDraft::from_json(config_bag)?.validate()?;
        self.start(questions, config)
    }

    fn begin(&self, session: QuizSession) -> QuizRun {
        tracing::info!(
            questions = session.total_questions(),
            time_limit_secs = ?session.config().time_limit_secs(),
            "quiz session started"
        );
        QuizRun {
            clock: self.clock,
            session,
            timer: None,
            timer_base_secs: 0,
            on_complete: None,
            notified: false,
        }
    }
}

/// A live session plus its timer and completion notification.
pub struct QuizRun {
    clock: Clock,
    session: QuizSession,
    timer: Option<SessionTimer>,
    /// Budget already consumed when the timer was started.
    timer_base_secs: u32,
    on_complete: Option<CompletionCallback>,
    notified: bool,
}

impl QuizRun {
    /// Register the callback fired when the session completes.
    #[must_use]
    pub fn with_on_complete(mut self, callback: impl FnOnce(CompletionEvent) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Advance a fixed clock; used to account elapsed time in untimed runs.
    pub fn advance_clock(&mut self, delta: chrono::Duration) {
        self.clock.advance(delta);
    }

    /// Spawn the one-second countdown task for timed sessions.
    ///
    /// Must be called from within a Tokio runtime. No-op for untimed or
    /// completed sessions, or when a timer is already running.
    pub fn start_timer(&mut self) {
        if self.session.is_timed() && !self.session.is_complete() && self.timer.is_none() {
            self.timer_base_secs = self.session.consumed_secs().unwrap_or(0);
            self.timer = Some(SessionTimer::start());
        }
    }

    #[must_use]
    pub fn has_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_cancelled())
    }

    /// Wait for the next timer tick without applying it.
    ///
    /// Resolves to `None` when there is no running timer, so it can sit in a
    /// `tokio::select!` next to UI events. Pass the tick to `apply_tick`.
    pub async fn next_tick(&mut self) -> Option<TimerTick> {
        let timer = self.timer.as_mut()?;
        timer.next_tick().await
    }

    /// Drive the countdown until the session completes or the timer stops.
    pub async fn run_timer(&mut self) {
        while !self.session.is_complete() {
            let Some(tick) = self.next_tick().await else {
                break;
            };
            self.apply_tick(tick);
        }
    }

    /// Apply a tick from the session timer.
    ///
    /// The countdown catches up to the time the timer has measured, so ticks
    /// that were never read still count against the budget.
    pub fn apply_tick(&mut self, tick: TimerTick) -> TickOutcome {
        let measured = u32::try_from(tick.elapsed_secs).unwrap_or(u32::MAX);
        let consumed = self.timer_base_secs.saturating_add(measured);
        let outcome = self.session.sync_elapsed(consumed, self.clock.now());
        self.after_tick(outcome, tick.seq);
        outcome
    }

    fn sync_timer(&mut self) {
        if let Some(tick) = self.timer.as_mut().and_then(SessionTimer::take_pending) {
            self.apply_tick(tick);
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once completed or in review.
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        self.session.select_answer(option).inspect_err(|err| {
            tracing::warn!(option, position = self.session.position(), %err, "answer rejected");
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once completed or in review.
    pub fn clear_answer(&mut self) -> Result<(), SessionError> {
        self.session.clear_answer().inspect_err(|err| {
            tracing::warn!(position = self.session.position(), %err, "clear rejected");
        })
    }

    pub fn show_explanation(&mut self) -> bool {
        self.session.show_explanation()
    }

    pub fn next(&mut self) -> Step {
        self.sync_timer();
        let step = self.session.next(self.clock.now());
        tracing::debug!(?step, "next");
        self.notify_if_complete();
        step
    }

    pub fn previous(&mut self) -> Step {
        let step = self.session.previous();
        tracing::debug!(?step, "previous");
        step
    }

    /// # Errors
    ///
    /// Returns `SessionError::PositionOutOfRange` for an invalid index.
    pub fn go_to(&mut self, index: usize) -> Result<Step, SessionError> {
        let step = self.session.go_to(index).inspect_err(|err| {
            tracing::warn!(index, %err, "jump rejected");
        })?;
        tracing::debug!(?step, "go to");
        Ok(step)
    }

    /// Complete the session now. Repeated calls return the same result.
    ///
    /// Time the timer measured but nobody applied yet is counted first, so
    /// an overdue session finishes as timed out.
    pub fn finish(&mut self) -> QuizResult {
        self.sync_timer();
        let result = self.session.complete(self.clock.now());
        self.notify_if_complete();
        result
    }

    /// Apply one second of the budget. Late ticks after completion are ignored.
    pub fn on_tick(&mut self) -> TickOutcome {
        let outcome = self.session.tick(self.clock.now());
        self.after_tick(outcome, 0);
        outcome
    }

    fn after_tick(&mut self, outcome: TickOutcome, seq: u64) {
        match outcome {
            TickOutcome::Running { remaining_secs } => {
                tracing::debug!(seq, remaining_secs, "timer tick");
            }
            TickOutcome::Expired => {
                tracing::info!("quiz time limit reached");
                self.notify_if_complete();
            }
            TickOutcome::Ignored => {}
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` while the session is in progress.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        self.session.enter_review()
    }

    pub fn exit_review(&mut self) {
        self.session.exit_review();
    }

    fn notify_if_complete(&mut self) {
        if self.notified {
            return;
        }
        let Some(result) = self.session.result() else {
            return;
        };
        self.notified = true;
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
        tracing::info!(
            earned = result.points_earned(),
            possible = result.points_possible(),
            percentage = result.percentage(),
            tier = %result.tier(),
            completion = ?result.completion(),
            "quiz session completed"
        );
        if let Some(callback) = self.on_complete.take() {
            callback(CompletionEvent::from(result));
        }
    }
}

impl fmt::Debug for QuizRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizRun")
            .field("session", &self.session)
            .field("timer", &self.timer)
            .field("has_callback", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;
    use std::sync::{Arc, Mutex};

    fn questions() -> Vec<Question> {
        (1..=3)
            .map(|id| {
                QuestionDraft::new(id, format!("Q{id}"), vec!["a".into(), "b".into()], 1, 10)
                    .validate()
                    .unwrap()
            })
            .collect()
    }

    fn recorder() -> (Arc<Mutex<Vec<CompletionEvent>>>, impl FnOnce(CompletionEvent) + Send) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        (events, move |event| sink.lock().unwrap().push(event))
    }

    #[test]
    fn callback_fires_once_on_finish() {
        let (events, callback) = recorder();
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::untimed())
            .unwrap()
            .with_on_complete(callback);

        run.select_answer(1).unwrap();
        let earned = run.finish().points_earned();
        run.finish();
        run.next();

        let events = events.lock().unwrap();
        assert_eq!(earned, 10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].points_earned, 10);
        assert_eq!(events[0].points_possible, 30);
        assert_eq!(events[0].question_count, 3);
    }

    #[test]
    fn next_past_last_question_notifies() {
        let (events, callback) = recorder();
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::untimed())
            .unwrap()
            .with_on_complete(callback);

        assert_eq!(run.next(), Step::Moved { position: 1 });
        assert_eq!(run.next(), Step::Moved { position: 2 });
        assert_eq!(run.next(), Step::Completed);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn manual_ticks_time_out_and_notify() {
        let (events, callback) = recorder();
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::timed(2))
            .unwrap()
            .with_on_complete(callback);

        assert_eq!(run.on_tick(), TickOutcome::Running { remaining_secs: 1 });
        assert_eq!(run.on_tick(), TickOutcome::Expired);
        assert_eq!(run.on_tick(), TickOutcome::Ignored);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn rejected_answer_in_review_keeps_state() {
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::untimed())
            .unwrap();
        run.select_answer(0).unwrap();
        run.finish();
        run.enter_review().unwrap();

        assert!(matches!(run.select_answer(1), Err(SessionError::Completed)));
        assert_eq!(run.session().answer(0), Some(0));
    }

    #[test]
    fn elapsed_follows_the_clock() {
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::untimed())
            .unwrap();
        run.advance_clock(chrono::Duration::seconds(42));
        assert_eq!(run.finish().elapsed_secs(), 42);
    }

    #[test]
    fn start_from_invalid_drafts_fails() {
        let drafts = vec![QuestionDraft::new(1, "Q", vec!["a".into(), "b".into()], 0, 0)];
        let err = QuizLoopService::new(fixed_clock())
            .start_from_drafts(drafts, QuizConfig::untimed())
            .unwrap_err();
        assert!(matches!(err, SessionError::Question(_)));
    }

    #[test]
    fn config_bag_drives_the_timer() {
        let mut run = QuizLoopService::new(fixed_clock())
            .start_with_config_bag(questions(), r#"{"timeLimitSeconds": 90}"#)
            .unwrap();
        assert_eq!(run.session().remaining_label().as_deref(), Some("1:30"));
        assert_eq!(run.on_tick(), TickOutcome::Running { remaining_secs: 89 });
    }

    #[test]
    fn bad_config_bag_is_rejected() {
        let service = QuizLoopService::new(fixed_clock());
        let err = service
            .start_with_config_bag(questions(), "not json")
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let err = service
            .start_with_config_bag(questions(), r#"{"criticalThresholdSeconds": 0}"#)
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn rejected_mutations_keep_state() {
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::untimed())
            .unwrap();
        assert!(matches!(
            run.go_to(9),
            Err(SessionError::PositionOutOfRange { index: 9, len: 3 })
        ));
        assert_eq!(run.session().position(), 0);

        run.select_answer(1).unwrap();
        run.finish();
        assert!(matches!(run.clear_answer(), Err(SessionError::Completed)));
        assert_eq!(run.session().answer(0), Some(1));
    }

    #[test]
    fn timer_ticks_catch_up_the_countdown() {
        let (events, callback) = recorder();
        let mut run = QuizLoopService::new(fixed_clock())
            .start(questions(), QuizConfig::timed(30))
            .unwrap()
            .with_on_complete(callback);
        run.on_tick();

        let tick = TimerTick {
            seq: 1,
            elapsed_secs: 12,
        };
        assert_eq!(run.apply_tick(tick), TickOutcome::Running { remaining_secs: 18 });

        let tick = TimerTick {
            seq: 2,
            elapsed_secs: 40,
        };
        assert_eq!(run.apply_tick(tick), TickOutcome::Expired);
        assert_eq!(run.session().result().unwrap().elapsed_secs(), 30);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = QuizLoopService::default()
            .start(Vec::new(), QuizConfig::untimed())
            .unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }
}
