//! Stage abstraction
//!
//! A stage is one named unit of work with a cumulative progress checkpoint.
//! Stages see the accumulator left by their predecessors and only ever touch
//! it through the `&mut ScanResult` they are handed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::time::Clock;
use crate::scanner::config::ScanConfig;
use crate::scanner::error::StageError;
use crate::scanner::types::ScanResult;

/// Read-only inputs shared by every stage of one scan
#[derive(Clone)]
pub struct StageContext {
    pub scan_id: String,
    pub url: Url,
    pub config: Arc<ScanConfig>,
    pub cancel: CancellationToken,
    pub clock: Arc<dyn Clock>,
    pub started: Instant,
}

impl StageContext {
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[async_trait]
pub trait Stage: Send + Sync {
    /// Human readable label reported as the current stage
    fn label(&self) -> &str;

    /// Cumulative percentage reached once this stage is done
    fn checkpoint(&self) -> f64;

    /// Disabled stages are skipped without a progress update
    fn is_enabled(&self, _config: &ScanConfig) -> bool {
        true
    }

    async fn run(&self, ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError>;
}
