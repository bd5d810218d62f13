//! Monotonic time sources
//!
//! Wall-clock time only drives the transient "repetition completed" message
//! and frame-log timestamps. Everything takes a `Clock` so tests can step
//! time by hand.

use std::time::{Duration, Instant};

pub trait Clock {
    /// Time elapsed since the clock's origin. Must never go backwards.
    fn now(&mut self) -> Duration;
}

/// `Instant`-backed clock for native builds
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for deterministic replays and tests
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self { now: start }
    }

    pub fn advance(&mut self, step: Duration) {
        self.now += step;
    }

    /// Jump to `t`; earlier times are ignored to keep the clock monotonic
    pub fn set(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> Duration {
        self.now
    }
}
