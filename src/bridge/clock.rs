//! `performance.now()` clock for the browser
//!
//! `std::time::Instant` is not available on wasm32-unknown-unknown.

use std::time::Duration;

use crate::time::Clock;

#[derive(Debug, Clone, Default)]
pub struct PerformanceClock {
    last: Duration,
}

impl PerformanceClock {
    pub fn new() -> Self {
        Self::default()
    }
}

fn performance_now_ms() -> Option<f64> {
    let performance = web_sys::window()?.performance()?;
    Some(performance.now())
}

impl Clock for PerformanceClock {
    /// Falls back to the last reading when no `window.performance` exists
    fn now(&mut self) -> Duration {
        if let Some(ms) = performance_now_ms() {
            let t = Duration::from_secs_f64(ms.max(0.0) / 1000.0);
            // Clamped so a misbehaving host cannot run time backwards
            self.last = self.last.max(t);
        }
        self.last
    }
}
