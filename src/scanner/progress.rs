//! Progress and ETA arithmetic
//!
//! The tracker is owned by the pipeline run. It produces the snapshots that
//! get copied into the instance, the storage port and the event sink.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::time::Clock;
use crate::scanner::types::ScanProgress;

/// `round(percentage / 100 * total_tasks)`
pub fn tasks_completed(percentage: f64, total_tasks: u32) -> u32 {
    let done = (percentage / 100.0 * f64::from(total_tasks)).round();
    (done.max(0.0) as u32).min(total_tasks)
}

/// `elapsed * (100 / percentage - 1)` in whole seconds; zero until progress is made
pub fn estimate_remaining(elapsed: Duration, percentage: f64) -> u64 {
    if percentage <= 0.0 {
        return 0;
    }
    let remaining = elapsed.as_secs_f64() * (100.0 / percentage - 1.0);
    remaining.max(0.0) as u64
}

pub struct ProgressTracker {
    clock: Arc<dyn Clock>,
    started: Instant,
    progress: ScanProgress,
}

impl ProgressTracker {
    pub fn new(clock: Arc<dyn Clock>, started: Instant, initial: ScanProgress) -> Self {
        Self {
            clock,
            started,
            progress: initial,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    /// Move to a new checkpoint. Percentage never goes backwards.
    pub fn advance(&mut self, percentage: f64, stage: &str) -> &ScanProgress {
        let percentage = percentage.clamp(0.0, 100.0).max(self.progress.percentage);

        self.progress.percentage = percentage;
        self.progress.current_stage = stage.to_string();
        self.progress.tasks_completed = tasks_completed(percentage, self.progress.total_tasks);
        self.progress.eta = estimate_remaining(self.elapsed(), percentage);

        &self.progress
    }

    pub fn record_warning(&mut self, message: String) {
        self.progress.warnings.push(message);
    }

    pub fn record_error(&mut self, message: String) {
        self.progress.errors.push(message);
    }

    pub fn into_progress(self) -> ScanProgress {
        self.progress
    }
}
