//! Finalization: marks the result completed and stamps its duration

use async_trait::async_trait;

use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::FINALIZE_CHECKPOINT;
use crate::scanner::types::{ScanResult, ScanStatus};

/// Stamps the terminal status and wall-clock duration
pub struct Finalization;

#[async_trait]
impl Stage for Finalization {
    fn label(&self) -> &str {
        "Finalizing scan"
    }

    fn checkpoint(&self) -> f64 {
        FINALIZE_CHECKPOINT
    }

    async fn run(&self, ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        result.status = ScanStatus::Completed;
        result.duration = ctx.elapsed().as_secs();
        Ok(())
    }
}
