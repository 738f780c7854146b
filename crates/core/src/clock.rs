//! Wall-clock abstraction so payload and audit timestamps are deterministic
//! under test.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Controllable clock for tests: reports a fixed instant until moved.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock to a specific instant.
    pub fn set(&self, to: DateTime<Local>) {
        *self.current.lock().expect("clock mutex poisoned") = to;
    }

    /// Advance the clock by the given delta.
    pub fn advance(&self, delta: TimeDelta) {
        *self.current.lock().expect("clock mutex poisoned") += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().expect("clock mutex poisoned")
    }
}
