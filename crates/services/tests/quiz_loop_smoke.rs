use std::sync::{Arc, Mutex};
use std::time::Duration;

use quiz_core::model::{CompletionReason, Question, QuestionDraft, QuizConfig, QuizConfigDraft};
use quiz_core::scoring::PerformanceTier;
use quiz_core::time::fixed_now;
use services::{Clock, CompletionEvent, QuizLoopService, ResultView, SessionError, Step, TickOutcome};
use tokio::sync::mpsc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn build_questions() -> Vec<Question> {
    let json = r#"[
        {"id": 1, "prompt": "First", "options": ["a", "b", "c"], "correctIndex": 1, "points": 10,
         "explanation": "b comes after a", "difficulty": "beginner"},
        {"id": 2, "prompt": "Second", "options": ["a", "b", "c"], "correctIndex": 0, "points": 20,
         "difficulty": "intermediate"},
        {"id": 3, "prompt": "Third", "options": ["a", "b", "c"], "correctIndex": 2, "points": 10,
         "difficulty": "advanced"}
    ]"#;
    let drafts: Vec<QuestionDraft> = serde_json::from_str(json).unwrap();
    quiz_core::validate_questions(drafts).unwrap()
}

fn recorder() -> (
    Arc<Mutex<Vec<CompletionEvent>>>,
    impl FnOnce(CompletionEvent) + Send + 'static,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event| sink.lock().unwrap().push(event))
}

#[test]
fn full_session_then_review() {
    init_tracing();
    let (events, callback) = recorder();
    let config = QuizConfigDraft::from_json("{}").unwrap().validate().unwrap();
    let mut run = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), config)
        .unwrap()
        .with_on_complete(callback);

    run.select_answer(1).unwrap();
    assert_eq!(run.next(), Step::Moved { position: 1 });
    run.select_answer(2).unwrap();
    assert_eq!(run.next(), Step::Moved { position: 2 });
    run.select_answer(2).unwrap();
    assert_eq!(run.next(), Step::Completed);

    let result = run.finish();
    assert_eq!(result.points_earned(), 20);
    assert_eq!(result.points_possible(), 40);
    assert_eq!(result.percentage(), 50);
    assert_eq!(result.tier(), PerformanceTier::Fair);

    let view = ResultView::from(&result);
    assert_eq!(view.tier_label, "fair");

    {
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].points_earned, 20);
        assert_eq!(events[0].result, result);
    }

    run.enter_review().unwrap();
    assert_eq!(run.session().position(), 0);
    let item = run.session().current_review_item().unwrap();
    assert!(item.is_correct);
    assert_eq!(item.explanation, Some("b comes after a"));

    let err = run.select_answer(0).unwrap_err();
    assert!(matches!(err, SessionError::Completed));
    assert_eq!(run.session().answer(0), Some(1));
    assert_eq!(run.session().result(), Some(&result));
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timer_expiry_auto_completes() {
    init_tracing();
    let (events, callback) = recorder();
    let mut run = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), QuizConfig::timed(60))
        .unwrap()
        .with_on_complete(callback);

    run.select_answer(1).unwrap();
    run.start_timer();
    assert!(run.has_timer());

    run.run_timer().await;

    assert!(run.session().is_complete());
    assert!(!run.has_timer());
    assert_eq!(run.session().remaining_secs(), Some(0));

    let timed_out = run.session().result().unwrap().clone();
    assert_eq!(timed_out.completion(), CompletionReason::TimedOut);
    assert_eq!(timed_out.elapsed_secs(), 60);

    // Same answers, finished by hand.
    let mut manual = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), QuizConfig::untimed())
        .unwrap();
    manual.select_answer(1).unwrap();
    let finished = manual.finish();
    assert_eq!(finished.points_earned(), timed_out.points_earned());
    assert_eq!(finished.percentage(), timed_out.percentage());
    assert_eq!(finished.correctness(), timed_out.correctness());

    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_finish_cancels_timer() {
    init_tracing();
    let mut run = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), QuizConfig::timed(300))
        .unwrap();
    run.start_timer();

    let tick = run.next_tick().await.unwrap();
    assert_eq!(run.apply_tick(tick), TickOutcome::Running { remaining_secs: 299 });

    // Three more seconds pass without anyone reading the timer.
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let result = run.finish();

    assert!(!run.has_timer());
    assert_eq!(run.next_tick().await, None);
    assert_eq!(run.on_tick(), TickOutcome::Ignored);
    assert_eq!(run.session().remaining_secs(), Some(296));
    assert_eq!(result.elapsed_secs(), 4);
    assert_eq!(result.completion(), CompletionReason::Finished);
}

#[tokio::test(start_paused = true)]
async fn stalled_reader_still_expires_on_budget() {
    init_tracing();
    let (events, callback) = recorder();
    let started = tokio::time::Instant::now();
    let mut run = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), QuizConfig::timed(60))
        .unwrap()
        .with_on_complete(callback);
    run.start_timer();

    tokio::time::sleep(Duration::from_millis(20_500)).await;
    let tick = run.next_tick().await.unwrap();
    assert_eq!(run.apply_tick(tick), TickOutcome::Running { remaining_secs: 40 });

    run.run_timer().await;

    assert_eq!(started.elapsed(), Duration::from_secs(60));
    let result = run.session().result().unwrap();
    assert_eq!(result.completion(), CompletionReason::TimedOut);
    assert_eq!(result.elapsed_secs(), 60);
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn overdue_finish_counts_as_timeout() {
    init_tracing();
    let mut run = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), QuizConfig::timed(10))
        .unwrap();
    run.start_timer();
    run.select_answer(1).unwrap();

    tokio::time::sleep(Duration::from_millis(15_500)).await;
    let result = run.finish();

    assert_eq!(result.completion(), CompletionReason::TimedOut);
    assert_eq!(result.elapsed_secs(), 10);
    assert_eq!(result.points_earned(), 10);
    assert!(!run.has_timer());
}

#[derive(Debug)]
enum UiEvent {
    Answer(usize),
    Next,
}

#[tokio::test(start_paused = true)]
async fn ui_events_and_ticks_interleave() {
    init_tracing();
    let (events, callback) = recorder();
    let mut run = QuizLoopService::new(Clock::fixed(fixed_now()))
        .start(build_questions(), QuizConfig::timed(90))
        .unwrap()
        .with_on_complete(callback);
    run.start_timer();

    let (ui_tx, mut ui_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        for event in [
            UiEvent::Answer(1),
            UiEvent::Next,
            UiEvent::Answer(0),
            UiEvent::Next,
            UiEvent::Next,
        ] {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            if ui_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    while !run.session().is_complete() {
        tokio::select! {
            Some(tick) = run.next_tick() => {
                run.apply_tick(tick);
            }
            Some(event) = ui_rx.recv() => match event {
                UiEvent::Answer(option) => run.select_answer(option).unwrap(),
                UiEvent::Next => {
                    run.next();
                }
            },
            else => break,
        }
    }

    let result = run.session().result().unwrap();
    assert_eq!(result.completion(), CompletionReason::Finished);
    assert_eq!(result.points_earned(), 30);
    assert!(result.elapsed_secs() >= 12 && result.elapsed_secs() <= 13);
    assert!(!run.has_timer());
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn empty_question_list_is_fatal() {
    let err = QuizLoopService::default()
        .start(Vec::new(), QuizConfig::timed(60))
        .unwrap_err();
    assert!(matches!(err, SessionError::Empty));
}
