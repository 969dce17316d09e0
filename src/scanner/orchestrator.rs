//! Scan Orchestrator
//!
//! Public entry point of the engine. Each orchestrator owns its registry and
//! a root cancellation token; every scan runs on its own tokio task under a
//! child of that token. Status and cancel calls only touch the registry and
//! the instance's copy-under-lock state, so they never wait on stage work.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::core::time::{Clock, SystemClock};
use crate::notifications::api::{Event, EventSink, ScanEvent, ScanEventType};
use crate::scanner::config::ScanConfig;
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::instance::ScanInstance;
use crate::scanner::pipeline::{Pipeline, PipelineOutcome, RunContext};
use crate::scanner::registry::ScanRegistry;
use crate::scanner::types::{ScanStatus, StatusRecord};
use crate::storage::api::{MemoryStore, ScanStore};

struct Engine {
    registry: ScanRegistry,
    pipeline: Pipeline,
    run: RunContext,
    root: CancellationToken,
}

#[derive(Clone)]
pub struct ScanOrchestrator {
    engine: Arc<Engine>,
}

#[derive(Default)]
pub struct ScanOrchestratorBuilder {
    store: Option<Arc<dyn ScanStore>>,
    sink: Option<Arc<dyn EventSink>>,
    pipeline: Option<Pipeline>,
    clock: Option<Arc<dyn Clock>>,
    root: Option<CancellationToken>,
}

impl ScanOrchestratorBuilder {
    pub fn store(mut self, store: Arc<dyn ScanStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Without a sink, events are disabled
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Parent token; cancelling it cancels every scan of this orchestrator
    pub fn root_token(mut self, token: CancellationToken) -> Self {
        self.root = Some(token);
        self
    }

    pub fn build(self) -> ScanOrchestrator {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn ScanStore>);
        ScanOrchestrator {
            engine: Arc::new(Engine {
                registry: ScanRegistry::new(),
                pipeline: self.pipeline.unwrap_or_default(),
                run: RunContext {
                    store,
                    sink: self.sink,
                    clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                },
                root: self.root.unwrap_or_default(),
            }),
        }
    }
}

impl ScanOrchestrator {
    pub fn builder() -> ScanOrchestratorBuilder {
        ScanOrchestratorBuilder::default()
    }

    /// Start a scan and return its identifier, or an empty string when the
    /// target is not a usable http(s) URL. Nothing is registered or spawned
    /// in that case.
    pub fn start_scan(&self, url: &str, config: &serde_json::Value) -> String {
        match self.try_start_scan(url, config) {
            Ok(scan_id) => scan_id,
            Err(e) => {
                log::warn!("Scan not started: {}", e);
                String::new()
            }
        }
    }

    pub fn try_start_scan(&self, url: &str, config: &serde_json::Value) -> ScanResult<String> {
        let target = parse_target(url)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| ScanError::Runtime {
            message: e.to_string(),
        })?;

        let config = Arc::new(ScanConfig::from_value(config));
        let scan_id = Uuid::new_v4().to_string();
        let clock = &self.engine.run.clock;
        let instance = Arc::new(ScanInstance::new(
            scan_id.clone(),
            target,
            config,
            clock.now(),
            clock.utc_now(),
            self.engine.root.child_token(),
        ));
        self.engine.registry.insert(Arc::clone(&instance))?;

        log::info!(
            "Scan {} started for {} ({} tasks)",
            scan_id,
            instance.url(),
            instance.config().total_tasks()
        );
        self.engine.run.emit(Event::Scan(ScanEvent::with_message(
            ScanEventType::Started,
            scan_id.clone(),
            instance.url().to_string(),
        )));

        let engine = Arc::clone(&self.engine);
        runtime.spawn(async move {
            let _guard = RegistryGuard {
                engine: Arc::clone(&engine),
                scan_id: instance.id().to_string(),
            };
            let outcome = engine.pipeline.run(&instance, &engine.run).await;
            engine.finalize(&instance, outcome).await;
        });

        Ok(scan_id)
    }

    pub fn get_status(&self, scan_id: &str) -> ScanResult<StatusRecord> {
        self.engine
            .registry
            .lookup(scan_id)
            .map(|instance| instance.status_record())
            .ok_or_else(|| ScanError::NotFound {
                scan_id: scan_id.to_string(),
            })
    }

    /// Status as a JSON object, `{"error": "not found"}` for unknown ids
    pub fn status_report(&self, scan_id: &str) -> serde_json::Value {
        match self.get_status(scan_id) {
            Ok(record) => serde_json::to_value(record)
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        }
    }

    pub fn cancel_scan(&self, scan_id: &str) -> ScanResult<()> {
        let instance = self
            .engine
            .registry
            .lookup(scan_id)
            .ok_or_else(|| ScanError::NotFound {
                scan_id: scan_id.to_string(),
            })?;
        log::info!("Cancellation requested for scan {}", scan_id);
        instance.request_cancel();
        Ok(())
    }

    /// Cancel every running scan; scans started afterwards cancel at once
    pub fn shutdown(&self) {
        for instance in self.engine.registry.instances() {
            instance.request_cancel();
        }
        self.engine.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.engine.root.is_cancelled()
    }

    pub fn active_scans(&self) -> Vec<String> {
        self.engine.registry.ids()
    }

    pub fn active_count(&self) -> usize {
        self.engine.registry.len()
    }

    pub fn store(&self) -> &Arc<dyn ScanStore> {
        &self.engine.run.store
    }
}

impl Engine {
    async fn finalize(&self, instance: &ScanInstance, outcome: PipelineOutcome) {
        let scan_id = instance.id();
        match outcome {
            PipelineOutcome::Completed(mut result) => {
                if let Some(progress) = &result.progress {
                    instance.store_progress(progress.clone());
                }
                instance.set_status(ScanStatus::Completed);
                log::info!(
                    "Scan {} completed in {}s with score {}",
                    scan_id,
                    result.duration,
                    result.security_score
                );

                if let Err(e) = self.run.persist_result(scan_id, &result).await {
                    log::debug!("Result for scan {} not persisted: {}", scan_id, e);
                    if let Some(progress) = result.progress.as_mut() {
                        progress.errors.push(format!("result not persisted: {}", e));
                    }
                }
                self.run.emit(Event::Scan(ScanEvent::completed(
                    scan_id.to_string(),
                    Arc::new(result),
                )));
            }
            PipelineOutcome::Cancelled(progress) => {
                instance.set_status(ScanStatus::Cancelled);
                log::info!(
                    "Scan {} cancelled at {:.0}% ({})",
                    scan_id,
                    progress.percentage,
                    progress.current_stage
                );
                self.run.emit(Event::Scan(ScanEvent {
                    progress: Some(progress),
                    ..ScanEvent::new(ScanEventType::Cancelled, scan_id.to_string())
                }));
            }
        }
        self.registry.remove(scan_id);
    }
}

/// Retires the instance even if the pipeline task panics
struct RegistryGuard {
    engine: Arc<Engine>,
    scan_id: String,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.engine.registry.remove(&self.scan_id);
    }
}

fn parse_target(url: &str) -> ScanResult<Url> {
    let invalid = |reason: String| ScanError::InvalidTarget {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}
