//! Shared helpers for integration tests
//!
//! A tiny HTTP responder on a local port so scans never leave the machine,
//! plus helpers for following a scan's events to its end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{timeout, Duration};

use watchdog::notifications::api::{Event, EventReceiver, ScanEvent, ScanEventType};

pub const HARDENED_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
Strict-Transport-Security: max-age=31536000; includeSubDomains\r\n\
X-Content-Type-Options: nosniff\r\n\
X-Frame-Options: DENY\r\n\
Content-Security-Policy: default-src 'self'\r\n\
Referrer-Policy: no-referrer\r\n\
Content-Length: 0\r\n\
Connection: close\r\n\r\n";

pub const EXPOSED_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
Server: Apache/2.4.57 (Unix)\r\n\
X-Powered-By: PHP/8.2.12\r\n\
Access-Control-Allow-Origin: *\r\n\
Set-Cookie: session=abc; Path=/\r\n\
Content-Length: 0\r\n\
Connection: close\r\n\r\n";

/// Local HTTP responder answering every connection with a canned response
pub struct TestServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start(response: &'static str) -> Self {
        Self::start_with_delay(response, Duration::ZERO).await
    }

    /// Wait `delay` after reading the request before answering
    pub async fn start_with_delay(response: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buffer = [0u8; 4096];
                    let _ = socket.read(&mut buffer).await;
                    tokio::time::sleep(delay).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            url: format!("http://{}/", address),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Next terminal (completed or cancelled) event for `scan_id`
pub async fn terminal_event(events: &mut EventReceiver, scan_id: &str) -> ScanEvent {
    timeout(Duration::from_secs(15), async {
        loop {
            match events.recv().await {
                Some(Event::Scan(event))
                    if event.scan_id == scan_id
                        && matches!(
                            event.event_type,
                            ScanEventType::Completed | ScanEventType::Cancelled
                        ) =>
                {
                    return event;
                }
                Some(_) => continue,
                None => panic!("event stream closed before scan {} finished", scan_id),
            }
        }
    })
    .await
    .expect("scan should reach a terminal state")
}

/// Terminal events for every id in `scan_ids`, in whatever order they arrive
pub async fn terminal_events(
    events: &mut EventReceiver,
    scan_ids: &[String],
) -> HashMap<String, ScanEvent> {
    let mut outcomes = HashMap::new();
    timeout(Duration::from_secs(15), async {
        while outcomes.len() < scan_ids.len() {
            match events.recv().await {
                Some(Event::Scan(event))
                    if scan_ids.contains(&event.scan_id)
                        && matches!(
                            event.event_type,
                            ScanEventType::Completed | ScanEventType::Cancelled
                        ) =>
                {
                    outcomes.insert(event.scan_id.clone(), event);
                }
                Some(_) => continue,
                None => panic!("event stream closed with scans outstanding"),
            }
        }
    })
    .await
    .expect("every scan should reach a terminal state");
    outcomes
}

/// Poll until `condition` holds or two seconds pass
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
