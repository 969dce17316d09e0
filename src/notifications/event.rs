//! Event types for the notification system

use chrono::{DateTime, Utc};
use std::sync::Arc;
use strum_macros::Display;

use crate::scanner::types::{ScanProgress, ScanResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScanEventType {
    Started,
    Progress,
    Warning,
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SystemEventType {
    Startup,
    Shutdown,
}

/// Lifecycle notification for a single scan
#[derive(Clone, Debug)]
pub struct ScanEvent {
    pub event_type: ScanEventType,
    pub timestamp: DateTime<Utc>,
    pub scan_id: String,
    pub message: Option<String>,
    pub progress: Option<ScanProgress>,
    pub result: Option<Arc<ScanResult>>,
}

impl ScanEvent {
    pub fn new(event_type: ScanEventType, scan_id: String) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            scan_id,
            message: None,
            progress: None,
            result: None,
        }
    }

    pub fn with_message(event_type: ScanEventType, scan_id: String, message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::new(event_type, scan_id)
        }
    }

    pub fn progress(scan_id: String, progress: ScanProgress) -> Self {
        Self {
            progress: Some(progress),
            ..Self::new(ScanEventType::Progress, scan_id)
        }
    }

    pub fn completed(scan_id: String, result: Arc<ScanResult>) -> Self {
        Self {
            progress: result.progress.clone(),
            result: Some(result),
            ..Self::new(ScanEventType::Completed, scan_id)
        }
    }
}

#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::new(event_type)
        }
    }
}

/// Unified event enum that encompasses all event types
#[derive(Clone, Debug)]
pub enum Event {
    Scan(ScanEvent),
    System(SystemEvent),
}

impl Event {
    /// Channel name front ends listen on
    pub fn channel(&self) -> &'static str {
        match self {
            Event::Scan(scan) => match scan.event_type {
                ScanEventType::Started | ScanEventType::Progress | ScanEventType::Warning => {
                    "scan:progress"
                }
                ScanEventType::Completed | ScanEventType::Cancelled => "scan:complete",
            },
            Event::System(_) => "system",
        }
    }

    pub fn scan_id(&self) -> Option<&str> {
        match self {
            Event::Scan(scan) => Some(&scan.scan_id),
            Event::System(_) => None,
        }
    }
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    ScanOnly,
    SystemOnly,
    /// Events of one scan only
    Scan(String),
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        match (self, event) {
            (EventFilter::All, _) => true,
            (EventFilter::ScanOnly, Event::Scan(_)) => true,
            (EventFilter::SystemOnly, Event::System(_)) => true,
            (EventFilter::Scan(id), Event::Scan(scan)) => *id == scan.scan_id,
            _ => false,
        }
    }
}
