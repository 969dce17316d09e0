//! Clock abstraction for ETA and duration math
//!
//! Progress tracking asks a [`Clock`] for both a monotonic instant (elapsed
//! time, ETA) and a wall-clock timestamp (the `timestamp`/`startedAt`
//! fields). Tests drive a [`ManualClock`] so the arithmetic is exact.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync {
    /// Monotonic time for measuring intervals
    fn now(&self) -> Instant;

    /// Wall-clock time for timestamps
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<(Instant, DateTime<Utc>)>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new((Instant::now(), Utc::now()))),
        }
    }

    /// Move both the monotonic and the wall clock forward
    pub fn advance(&self, by: Duration) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.0 += by;
        if let Ok(delta) = chrono::Duration::from_std(by) {
            state.1 += delta;
        }
    }

    fn snapshot(&self) -> (Instant, DateTime<Utc>) {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.snapshot().0
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.snapshot().1
    }
}
