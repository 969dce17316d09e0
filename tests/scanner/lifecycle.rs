//! Scan lifecycle through the public API

use serde_json::json;
use std::sync::Arc;

use crate::common::{terminal_event, wait_until, TestServer, EXPOSED_RESPONSE, HARDENED_RESPONSE};
use watchdog::notifications::api::{
    Event, EventFilter, EventSink, NotificationManager, ScanEventType,
};
use watchdog::scanner::api::{ScanError, ScanOrchestrator, ScanStatus, Severity};
use watchdog::storage::api::{MemoryStore, ScanStore};

struct Harness {
    orchestrator: ScanOrchestrator,
    store: Arc<MemoryStore>,
    notifications: Arc<NotificationManager>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(NotificationManager::new());
    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::clone(&store) as Arc<dyn ScanStore>)
        .event_sink(Arc::clone(&notifications) as Arc<dyn EventSink>)
        .build();
    Harness {
        orchestrator,
        store,
        notifications,
    }
}

#[tokio::test]
async fn test_hardened_site_standard_scan() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let scan_id = h.orchestrator.start_scan(&server.url, &json!({}));
    assert!(!scan_id.is_empty());

    let event = terminal_event(&mut events, &scan_id).await;
    assert_eq!(event.event_type, ScanEventType::Completed);
    let result = event.result.expect("completion carries the result");

    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.status_code, Some(200));
    // Only plaintext transport is held against an otherwise hardened response
    assert_eq!(result.security_score, 80);
    assert_eq!(result.vulnerabilities.len(), 1);
    assert_eq!(result.vulnerabilities[0].severity, Severity::High);
    assert!(result.ssl_info.is_none(), "no TLS summary for http targets");
    assert_eq!(result.dns_info.host, "127.0.0.1");
    assert_eq!(server.hits(), 1, "reconnaissance issues exactly one request");

    let history: Vec<f64> = h
        .store
        .progress_history(&scan_id)
        .iter()
        .map(|p| p.percentage)
        .collect();
    assert_eq!(history, vec![10.0, 25.0, 40.0, 60.0, 80.0, 100.0]);
    assert_eq!(h.store.save_count(&scan_id), 1);

    let stored = h.store.load_result(&scan_id).await.unwrap().unwrap();
    assert_eq!(&stored, result.as_ref());
    let final_progress = stored.progress.unwrap();
    assert_eq!(final_progress.tasks_completed, final_progress.total_tasks);
    assert_eq!(final_progress.total_tasks, 8);
}

#[tokio::test]
async fn test_exposed_site_findings_and_score() {
    let server = TestServer::start(EXPOSED_RESPONSE).await;
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let scan_id = h.orchestrator.start_scan(&server.url, &json!({}));
    let result = terminal_event(&mut events, &scan_id).await.result.unwrap();

    let mut ids: Vec<&str> = result.vulnerabilities.iter().map(|v| v.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        vec![
            "insecure-cookie",
            "missing-content-security-policy",
            "permissive-cors",
            "plaintext-transport",
            "powered-by-disclosure",
            "server-version-disclosure",
        ]
    );
    // 100 - (20 + 5 + 5 + 10 + 10 + 10) - 3 missing headers * 5
    assert_eq!(result.security_score, 25);

    let names: Vec<&str> = result.tech_stack.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Apache HTTP Server"));
    assert!(names.contains(&"PHP"));
}

#[tokio::test]
async fn test_all_optional_stages() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let config = json!({ "complianceScan": true, "performanceScan": true, "timeout": 5 });
    let scan_id = h.orchestrator.start_scan(&server.url, &config);
    let result = terminal_event(&mut events, &scan_id).await.result.unwrap();

    let compliance = result.compliance.as_ref().expect("compliance assessed");
    assert_eq!(compliance.checks.len(), 6);
    assert_eq!(compliance.failed(), 1, "only transport encryption fails over http");
    assert!(result.performance.is_some());
    assert_eq!(result.scan_config.timeout, 5);

    let history: Vec<f64> = h
        .store
        .progress_history(&scan_id)
        .iter()
        .map(|p| p.percentage)
        .collect();
    assert_eq!(history, vec![10.0, 25.0, 40.0, 60.0, 65.0, 70.0, 80.0, 100.0]);
    assert_eq!(result.progress.as_ref().unwrap().total_tasks, 12);
}

#[tokio::test]
async fn test_minimal_configuration_skips_vulnerability_stage() {
    let server = TestServer::start(EXPOSED_RESPONSE).await;
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let scan_id = h
        .orchestrator
        .start_scan(&server.url, &json!({ "vulnerabilityScan": false }));
    let result = terminal_event(&mut events, &scan_id).await.result.unwrap();

    assert!(result.vulnerabilities.is_empty());
    assert_eq!(result.security_score, 85, "only missing headers count");
    assert_eq!(result.progress.as_ref().unwrap().total_tasks, 5);
}

#[tokio::test]
async fn test_unreachable_target_completes_with_warnings() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let url = format!("http://127.0.0.1:{}/", port);
    let scan_id = h.orchestrator.start_scan(&url, &json!({ "timeout": 2 }));
    let event = terminal_event(&mut events, &scan_id).await;

    assert_eq!(event.event_type, ScanEventType::Completed);
    let result = event.result.unwrap();
    assert_eq!(result.status_code, None);
    assert_eq!(result.security_score, 85);
    let warnings = &result.progress.as_ref().unwrap().warnings;
    assert!(warnings.iter().any(|w| w.starts_with("Initial reconnaissance")));
    assert!(warnings.iter().any(|w| w.starts_with("Scanning for vulnerabilities")));
}

#[tokio::test]
async fn test_invalid_urls_start_nothing() {
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::All, "lifecycle".into())
        .unwrap();

    for url in ["", "not a url", "ftp://example.com", "mailto:a@b.test"] {
        assert_eq!(h.orchestrator.start_scan(url, &json!({})), "");
    }
    assert!(matches!(
        h.orchestrator.try_start_scan("example.com", &json!({})),
        Err(ScanError::InvalidTarget { .. })
    ));

    assert_eq!(h.orchestrator.active_count(), 0);
    assert!(events.try_recv().is_err(), "no events for rejected targets");
}

#[tokio::test]
async fn test_status_while_running_then_not_found() {
    let server =
        TestServer::start_with_delay(HARDENED_RESPONSE, std::time::Duration::from_millis(300))
            .await;
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("test".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let scan_id = h.orchestrator.start_scan(&server.url, &json!({}));
    let record = h.orchestrator.get_status(&scan_id).unwrap();
    assert_eq!(record.id, scan_id);
    assert_eq!(record.status, ScanStatus::Running);
    assert_eq!(record.url, server.url);
    assert!(record.progress.percentage < 100.0);

    let report = h.orchestrator.status_report(&scan_id);
    assert_eq!(report["status"], "running");
    assert!(report["progress"]["currentStage"].is_string());

    terminal_event(&mut events, &scan_id).await;
    assert!(wait_until(|| h.orchestrator.active_count() == 0).await);
    assert!(matches!(
        h.orchestrator.get_status(&scan_id),
        Err(ScanError::NotFound { .. })
    ));
    assert_eq!(
        h.orchestrator.status_report(&scan_id),
        json!({ "error": "not found" })
    );
}

#[tokio::test]
async fn test_event_channels_follow_lifecycle() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let h = harness();
    let mut events = h
        .notifications
        .subscribe("sequence".into(), EventFilter::ScanOnly, "lifecycle".into())
        .unwrap();

    let scan_id = h.orchestrator.start_scan(&server.url, &json!({}));
    let mut sequence = Vec::new();
    loop {
        let event = tokio::time::timeout(std::time::Duration::from_secs(15), events.recv())
            .await
            .expect("scan should finish")
            .expect("stream stays open");
        let Event::Scan(scan_event) = &event else {
            continue;
        };
        assert_eq!(scan_event.scan_id, scan_id);
        sequence.push((scan_event.event_type, event.channel()));
        if scan_event.event_type == ScanEventType::Completed {
            break;
        }
    }

    assert_eq!(sequence.first(), Some(&(ScanEventType::Started, "scan:progress")));
    assert_eq!(sequence.last(), Some(&(ScanEventType::Completed, "scan:complete")));
    let progress_events = sequence
        .iter()
        .filter(|(kind, _)| *kind == ScanEventType::Progress)
        .count();
    assert_eq!(progress_events, 6);
}
