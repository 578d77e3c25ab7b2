use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Whole seconds between two instants, clamped at zero.
#[must_use]
pub fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

/// Render seconds as `m:ss`.
#[must_use]
pub fn format_clock(total_secs: u64) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes}:{seconds:02}")
}

//
// ─── COUNTDOWN ────────────────────────────────────────────────────────────────
//

/// Result of applying one second to a `Countdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Running { remaining_secs: u32 },
    /// Reached zero on this tick. Reported exactly once.
    Expired,
    /// Countdown already stopped or expired; the tick had no effect.
    Stopped,
}

/// Whole-session time budget, advanced one second per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    critical_threshold_secs: u32,
    running: bool,
}

impl Countdown {
    /// Returns `None` for a zero budget, which means untimed.
    #[must_use]
    pub fn new(total_secs: u32, critical_threshold_secs: u32) -> Option<Self> {
        (total_secs > 0).then_some(Self {
            total_secs,
            remaining_secs: total_secs,
            critical_threshold_secs,
            running: true,
        })
    }

    pub fn tick(&mut self) -> CountdownTick {
        self.advance_to(self.elapsed_secs().saturating_add(1))
    }

    /// Catch up to `elapsed_secs` consumed since the start, however many
    /// seconds that skips. Never moves backwards.
    pub fn advance_to(&mut self, elapsed_secs: u32) -> CountdownTick {
        if !self.running {
            return CountdownTick::Stopped;
        }
        let elapsed = elapsed_secs.clamp(self.elapsed_secs(), self.total_secs);
        self.remaining_secs = self.total_secs - elapsed;
        if self.remaining_secs == 0 {
            self.running = false;
            CountdownTick::Expired
        } else {
            CountdownTick::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    /// Freeze the remaining time. Later ticks are ignored.
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }

    /// True while running with at most the critical threshold left.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.running && self.remaining_secs <= self.critical_threshold_secs
    }

    #[must_use]
    pub fn label(&self) -> String {
        format_clock(u64::from(self.remaining_secs))
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
