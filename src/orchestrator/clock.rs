//! Monotonic clocks for debounce decisions.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Monotonic time since an arbitrary fixed origin.
pub trait OrchestratorClock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Runtime clock; follows tokio's paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: Duration) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(by);
    }
}

impl OrchestratorClock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
