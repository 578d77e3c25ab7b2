use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// One elapsed period of a `SessionTimer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerTick {
    pub seq: u64,
    /// Whole seconds since the timer started, measured on the runtime clock.
    pub elapsed_secs: u64,
}

/// Owned countdown driver for a single session.
///
/// Spawns a Tokio task that publishes a `TimerTick` every period. Only the
/// latest tick is kept, and it carries the total elapsed time, so a reader that
/// falls behind catches up in one step instead of losing seconds. The task is
/// aborted on `cancel` and on drop, and no tick is handed out after that.
pub struct SessionTimer {
    task: Option<JoinHandle<()>>,
    ticks: watch::Receiver<TimerTick>,
}

impl SessionTimer {
    pub const PERIOD: Duration = Duration::from_secs(1);

    /// Start a one-second timer.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start() -> Self {
        Self::with_period(Self::PERIOD)
    }

    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let (tx, ticks) = watch::channel(TimerTick::default());
        let started = Instant::now();
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(started + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut seq = 0_u64;
            loop {
                interval.tick().await;
                seq += 1;
                let tick = TimerTick {
                    seq,
                    elapsed_secs: started.elapsed().as_secs(),
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        });

        Self {
            task: Some(task),
            ticks,
        }
    }

    /// Wait for the next tick. Returns `None` once cancelled.
    pub async fn next_tick(&mut self) -> Option<TimerTick> {
        if self.task.is_none() {
            return None;
        }
        self.ticks.changed().await.ok()?;
        Some(*self.ticks.borrow_and_update())
    }

    /// The newest tick not yet handed out, without waiting.
    pub fn take_pending(&mut self) -> Option<TimerTick> {
        if self.task.is_none() || !self.ticks.has_changed().unwrap_or(false) {
            return None;
        }
        Some(*self.ticks.borrow_and_update())
    }

    /// Stop the timer. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("session timer cancelled");
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SessionTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTimer")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
