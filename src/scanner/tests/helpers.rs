//! Scripted stages and fixtures shared by the scanner unit tests
//!
//! These stages never touch the network so pipeline and orchestrator
//! behaviour can be tested in isolation.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::time::{Clock, ManualClock};
use crate::notifications::api::{EventFilter, EventReceiver, NotificationManager};
use crate::scanner::config::ScanConfig;
use crate::scanner::error::StageError;
use crate::scanner::instance::ScanInstance;
use crate::scanner::pipeline::{Pipeline, RunContext};
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::types::ScanResult;
use crate::storage::api::MemoryStore;

/// Stage that sleeps, optionally fails, and counts its runs
pub struct ScriptedStage {
    pub label: &'static str,
    pub checkpoint: f64,
    pub delay: Duration,
    pub fail: bool,
    pub enabled: bool,
    pub runs: Arc<AtomicUsize>,
}

impl ScriptedStage {
    pub fn new(label: &'static str, checkpoint: f64) -> Self {
        Self {
            label,
            checkpoint,
            delay: Duration::ZERO,
            fail: false,
            enabled: true,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }
}

#[async_trait]
impl Stage for ScriptedStage {
    fn label(&self) -> &str {
        self.label
    }

    fn checkpoint(&self) -> f64 {
        self.checkpoint
    }

    fn is_enabled(&self, _config: &ScanConfig) -> bool {
        self.enabled
    }

    async fn run(&self, _ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        // Leave a trace so tests can see which stages touched the accumulator
        result
            .headers
            .insert(format!("x-stage-{}", self.checkpoint), self.label.to_string());
        if self.fail {
            return Err(StageError::Other(format!("{} failed", self.label)));
        }
        Ok(())
    }
}

/// Six quick stages on the standard checkpoints
pub fn quick_pipeline(delay: Duration) -> Pipeline {
    Pipeline::new(
        [
            ("Initial reconnaissance", 10.0),
            ("Detecting technologies", 25.0),
            ("Analyzing SSL/TLS", 40.0),
            ("Scanning for vulnerabilities", 60.0),
            ("Calculating security score", 80.0),
            ("Finalizing scan", 100.0),
        ]
        .into_iter()
        .map(|(label, checkpoint)| {
            Box::new(ScriptedStage::new(label, checkpoint).delayed(delay)) as Box<dyn Stage>
        })
        .collect(),
    )
}

pub struct RunFixture {
    pub store: Arc<MemoryStore>,
    pub notifications: Arc<NotificationManager>,
    pub events: EventReceiver,
    pub clock: ManualClock,
    pub run: RunContext,
}

pub fn run_fixture() -> RunFixture {
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(NotificationManager::new());
    let events = notifications
        .subscribe("test".to_string(), EventFilter::All, "scanner:test".to_string())
        .unwrap();
    let clock = ManualClock::new();
    let run = RunContext {
        store: store.clone(),
        sink: Some(notifications.clone()),
        clock: Arc::new(clock.clone()),
    };
    RunFixture {
        store,
        notifications,
        events,
        clock,
        run,
    }
}

pub fn instance(id: &str, config: ScanConfig, clock: &ManualClock) -> ScanInstance {
    ScanInstance::new(
        id.to_string(),
        Url::parse("https://example.com").unwrap(),
        Arc::new(config),
        clock.now(),
        Utc::now(),
        CancellationToken::new(),
    )
}

/// Poll until `condition` holds or the deadline passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
