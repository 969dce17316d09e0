//! Storage port behaviour seen from the orchestrator

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::common::{terminal_event, wait_until, TestServer, HARDENED_RESPONSE};
use watchdog::notifications::api::{
    Event, EventFilter, EventSink, NotificationError, NotificationManager, ScanEventType,
};
use watchdog::scanner::api::{ScanOrchestrator, ScanProgress, ScanResult};
use watchdog::storage::api::{JsonDirStore, MemoryStore, ScanStore, StorageError, StorageResult};

/// Store that refuses every write
#[derive(Default)]
struct UnavailableStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl ScanStore for UnavailableStore {
    async fn save_result(&self, _scan_id: &str, _result: &ScanResult) -> StorageResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable {
            message: "database offline".to_string(),
        })
    }

    async fn update_progress(&self, _scan_id: &str, _progress: &ScanProgress) -> StorageResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable {
            message: "database offline".to_string(),
        })
    }

    async fn load_result(&self, _scan_id: &str) -> StorageResult<Option<ScanResult>> {
        Ok(None)
    }

    async fn load_progress(&self, _scan_id: &str) -> StorageResult<Option<ScanProgress>> {
        Ok(None)
    }

    async fn list_results(&self) -> StorageResult<Vec<ScanResult>> {
        Ok(Vec::new())
    }

    async fn delete_result(&self, _scan_id: &str) -> StorageResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_storage_failures_do_not_stop_the_scan() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let store = Arc::new(UnavailableStore::default());
    let notifications = Arc::new(NotificationManager::new());
    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::clone(&store) as Arc<dyn ScanStore>)
        .event_sink(Arc::clone(&notifications) as Arc<dyn EventSink>)
        .build();
    let mut events = notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "persistence".into())
        .unwrap();

    let scan_id = orchestrator.start_scan(&server.url, &json!({}));
    let event = terminal_event(&mut events, &scan_id).await;

    assert_eq!(event.event_type, ScanEventType::Completed);
    // six progress updates and one final save were all attempted
    assert_eq!(store.attempts.load(Ordering::SeqCst), 7);
    assert!(wait_until(|| orchestrator.active_count() == 0).await);

    let result = event.result.unwrap();
    let errors = &result.progress.as_ref().unwrap().errors;
    assert_eq!(errors.len(), 7);
    assert!(errors.iter().all(|e| e.contains("database offline")));
    assert!(errors[0].contains("progress not persisted"));
    assert!(errors[6].starts_with("result not persisted"));
}

/// Store whose writes panic
struct PanickingStore;

#[async_trait]
impl ScanStore for PanickingStore {
    async fn save_result(&self, _scan_id: &str, _result: &ScanResult) -> StorageResult<()> {
        panic!("result table dropped");
    }

    async fn update_progress(&self, _scan_id: &str, _progress: &ScanProgress) -> StorageResult<()> {
        panic!("progress table dropped");
    }

    async fn load_result(&self, _scan_id: &str) -> StorageResult<Option<ScanResult>> {
        Ok(None)
    }

    async fn load_progress(&self, _scan_id: &str) -> StorageResult<Option<ScanProgress>> {
        Ok(None)
    }

    async fn list_results(&self) -> StorageResult<Vec<ScanResult>> {
        Ok(Vec::new())
    }

    async fn delete_result(&self, _scan_id: &str) -> StorageResult<()> {
        Ok(())
    }
}

/// Sink that panics on progress events and forwards everything else
struct PanickingSink {
    inner: Arc<NotificationManager>,
    panics: AtomicUsize,
}

impl EventSink for PanickingSink {
    fn emit(&self, event: Event) -> Result<(), NotificationError> {
        if let Event::Scan(scan) = &event {
            if scan.event_type == ScanEventType::Progress {
                self.panics.fetch_add(1, Ordering::SeqCst);
                panic!("no active listener");
            }
        }
        self.inner.emit(event)
    }
}

#[tokio::test]
async fn test_panicking_sink_does_not_lose_the_result() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(NotificationManager::new());
    let sink = Arc::new(PanickingSink {
        inner: Arc::clone(&notifications),
        panics: AtomicUsize::new(0),
    });
    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::clone(&store) as Arc<dyn ScanStore>)
        .event_sink(Arc::clone(&sink) as Arc<dyn EventSink>)
        .build();
    let mut events = notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "persistence".into())
        .unwrap();

    let scan_id = orchestrator.start_scan(&server.url, &json!({}));
    let event = terminal_event(&mut events, &scan_id).await;

    assert_eq!(event.event_type, ScanEventType::Completed);
    assert_eq!(sink.panics.load(Ordering::SeqCst), 6);
    let saved = store.load_result(&scan_id).await.unwrap();
    assert_eq!(saved.map(|r| r.security_score), Some(80));
    assert!(wait_until(|| orchestrator.active_count() == 0).await);
}

#[tokio::test]
async fn test_panicking_store_does_not_stop_the_scan() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let notifications = Arc::new(NotificationManager::new());
    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::new(PanickingStore) as Arc<dyn ScanStore>)
        .event_sink(Arc::clone(&notifications) as Arc<dyn EventSink>)
        .build();
    let mut events = notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "persistence".into())
        .unwrap();

    let scan_id = orchestrator.start_scan(&server.url, &json!({}));
    let event = terminal_event(&mut events, &scan_id).await;

    assert_eq!(event.event_type, ScanEventType::Completed);
    let result = event.result.unwrap();
    assert_eq!(result.security_score, 80);
    let errors = &result.progress.as_ref().unwrap().errors;
    assert_eq!(errors.len(), 7);
    assert!(errors.iter().all(|e| e.contains("storage panicked")));
    assert!(wait_until(|| orchestrator.active_count() == 0).await);
}

#[tokio::test]
async fn test_json_directory_store_keeps_results_and_progress() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonDirStore::open(dir.path().join("scans")).await.unwrap());
    let notifications = Arc::new(NotificationManager::new());
    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::clone(&store) as Arc<dyn ScanStore>)
        .event_sink(Arc::clone(&notifications) as Arc<dyn EventSink>)
        .build();
    let mut events = notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "persistence".into())
        .unwrap();

    let first = orchestrator.start_scan(&server.url, &json!({}));
    let first_result = terminal_event(&mut events, &first).await.result.unwrap();
    let second = orchestrator.start_scan(&server.url, &json!({ "performanceScan": true }));
    terminal_event(&mut events, &second).await;

    assert!(store.result_path(&first).exists());
    assert!(store.progress_path(&first).exists());

    let loaded = store.load_result(&first).await.unwrap().unwrap();
    assert_eq!(&loaded, first_result.as_ref());

    let progress = store.load_progress(&first).await.unwrap().unwrap();
    assert_eq!(progress.percentage, 100.0);

    let listed = store.list_results().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()], "newest first");

    store.delete_result(&first).await.unwrap();
    assert!(store.load_result(&first).await.unwrap().is_none());
    assert!(!store.progress_path(&first).exists());
}

#[tokio::test]
async fn test_json_result_uses_wire_field_names() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonDirStore::open(dir.path()).await.unwrap());
    let notifications = Arc::new(NotificationManager::new());
    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::clone(&store) as Arc<dyn ScanStore>)
        .event_sink(Arc::clone(&notifications) as Arc<dyn EventSink>)
        .build();
    let mut events = notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "persistence".into())
        .unwrap();

    let scan_id = orchestrator.start_scan(&server.url, &json!({}));
    terminal_event(&mut events, &scan_id).await;

    let text = std::fs::read_to_string(store.result_path(&scan_id)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in [
        "id",
        "url",
        "timestamp",
        "status",
        "techStack",
        "vulnerabilities",
        "securityScore",
        "scanConfig",
        "duration",
        "progress",
        "headers",
        "statusCode",
        "responseTime",
        "dnsInfo",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["status"], "completed");
    assert_eq!(value["scanConfig"]["userAgent"], "Watchdog/1.0");
}
