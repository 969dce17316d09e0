//! Stage pipeline
//!
//! Runs stages strictly in order against one accumulator. Cancellation is
//! observed at stage entry and after each stage's work; a stage failure is
//! recorded as a warning and the run moves on. After every stage the progress
//! snapshot is copied into the instance and pushed to the storage port and the
//! event sink, neither of which can stop the run: their errors and panics are
//! contained at the call site. Failed progress writes are kept as progress
//! errors.

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::core::time::Clock;
use crate::notifications::api::{Event, EventSink, ScanEvent, ScanEventType};
use crate::scanner::error::StageError;
use crate::scanner::instance::ScanInstance;
use crate::scanner::progress::ProgressTracker;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::standard_stages;
use crate::scanner::types::{ScanProgress, ScanResult};
use crate::storage::api::ScanStore;

/// How a run ended
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(ScanResult),
    /// Last progress reached before cancellation was observed
    Cancelled(ScanProgress),
}

/// Collaborators a run reports to
#[derive(Clone)]
pub struct RunContext {
    pub store: Arc<dyn ScanStore>,
    pub sink: Option<Arc<dyn EventSink>>,
    pub clock: Arc<dyn Clock>,
}

impl RunContext {
    /// Hand an event to the sink; errors and panics from the sink are dropped
    pub fn emit(&self, event: Event) {
        let Some(sink) = &self.sink else { return };
        match panic::catch_unwind(AssertUnwindSafe(|| sink.emit(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::debug!("Event dropped: {}", e),
            Err(_) => log::debug!("Event sink panicked; event dropped"),
        }
    }

    /// Write a progress snapshot to the store; a failure or panic comes back as a message
    pub async fn persist_progress(
        &self,
        scan_id: &str,
        progress: &ScanProgress,
    ) -> Result<(), String> {
        let store = Arc::clone(&self.store);
        let scan_id = scan_id.to_string();
        let progress = progress.clone();
        contained(tokio::spawn(async move {
            store.update_progress(&scan_id, &progress).await
        }))
        .await
    }

    /// Write a final result to the store; a failure or panic comes back as a message
    pub async fn persist_result(&self, scan_id: &str, result: &ScanResult) -> Result<(), String> {
        let store = Arc::clone(&self.store);
        let scan_id = scan_id.to_string();
        let result = result.clone();
        contained(tokio::spawn(async move {
            store.save_result(&scan_id, &result).await
        }))
        .await
    }
}

async fn contained<E: Display>(task: JoinHandle<Result<(), E>>) -> Result<(), String> {
    match task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) if e.is_panic() => Err("storage panicked".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn standard() -> Self {
        Self::new(standard_stages())
    }

    pub fn stage_labels(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.label()).collect()
    }

    pub async fn run(&self, instance: &ScanInstance, run: &RunContext) -> PipelineOutcome {
        let ctx = StageContext {
            scan_id: instance.id().to_string(),
            url: instance.url().clone(),
            config: Arc::clone(instance.config()),
            cancel: instance.cancellation_token().clone(),
            clock: Arc::clone(&run.clock),
            started: instance.started(),
        };
        let mut tracker =
            ProgressTracker::new(Arc::clone(&run.clock), instance.started(), instance.progress());
        let mut result = ScanResult::new(
            instance.id(),
            instance.url().as_str(),
            ctx.config.as_ref().clone(),
            instance.started_at(),
        );

        for stage in &self.stages {
            if !stage.is_enabled(&ctx.config) {
                log::trace!("Scan {} skipping disabled stage '{}'", ctx.scan_id, stage.label());
                continue;
            }
            if ctx.is_cancelled() {
                return PipelineOutcome::Cancelled(tracker.into_progress());
            }

            match stage.run(&ctx, &mut result).await {
                Ok(()) => {}
                Err(StageError::Interrupted { .. }) => {
                    return PipelineOutcome::Cancelled(tracker.into_progress());
                }
                Err(e) => {
                    let message = format!("{}: {}", stage.label(), e);
                    log::warn!("Scan {} stage failed: {}", ctx.scan_id, message);
                    tracker.record_warning(message.clone());
                    run.emit(Event::Scan(ScanEvent::with_message(
                        ScanEventType::Warning,
                        ctx.scan_id.clone(),
                        message,
                    )));
                }
            }

            if ctx.is_cancelled() {
                return PipelineOutcome::Cancelled(tracker.into_progress());
            }

            let snapshot = tracker.advance(stage.checkpoint(), stage.label()).clone();
            if let Err(e) = report_progress(instance, run, snapshot).await {
                tracker.record_error(format!("{}: progress not persisted: {}", stage.label(), e));
            }
        }

        result.progress = Some(tracker.into_progress());
        PipelineOutcome::Completed(result)
    }
}

async fn report_progress(
    instance: &ScanInstance,
    run: &RunContext,
    snapshot: ScanProgress,
) -> Result<(), String> {
    log::debug!(
        "Scan {} at {:.0}% ({}), eta {}s",
        instance.id(),
        snapshot.percentage,
        snapshot.current_stage,
        snapshot.eta
    );
    instance.store_progress(snapshot.clone());

    let persisted = run.persist_progress(instance.id(), &snapshot).await;
    if let Err(e) = &persisted {
        log::debug!("Progress for scan {} not persisted: {}", instance.id(), e);
    }
    run.emit(Event::Scan(ScanEvent::progress(
        instance.id().to_string(),
        snapshot,
    )));
    persisted
}
