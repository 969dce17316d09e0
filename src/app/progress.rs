//! Terminal progress line for a running scan
//!
//! Subscribes to scan events before the scan starts, redraws a one-line
//! spinner with percentage, stage and ETA on stderr, and returns once the
//! watched scan reports completion or cancellation.

use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{interval, Duration};

use crate::notifications::api::{Event, EventReceiver, ScanEvent, ScanEventType};
use crate::scanner::api::{ScanProgress, ScanResult};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgressError {
    /// The notification channel closed before the scan finished
    #[error("event stream for scan {scan_id} closed before the scan finished")]
    StreamClosed { scan_id: String },
}

impl crate::core::error_handling::ContextualError for ProgressError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Only draw when stderr is a terminal that is not already receiving info logs
pub fn should_show_progress() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr()) && !log::log_enabled!(log::Level::Info)
}

/// How the watched scan ended
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Completed(Arc<ScanResult>),
    Cancelled(Option<ScanProgress>),
}

pub struct ProgressLine {
    frame_index: usize,
    latest: Option<ScanProgress>,
    enabled: bool,
}

impl ProgressLine {
    pub fn new(enabled: bool) -> Self {
        Self {
            frame_index: 0,
            latest: None,
            enabled,
        }
    }

    pub fn update(&mut self, progress: ScanProgress) {
        self.latest = Some(progress);
        self.tick();
    }

    pub fn tick(&mut self) {
        let frame = BRAILLE_FRAMES[self.frame_index];
        self.frame_index = (self.frame_index + 1) % BRAILLE_FRAMES.len();
        if self.enabled {
            eprint!("\r\x1b[2K{}", self.render(frame));
            let _ = std::io::stderr().flush();
        }
    }

    pub fn render(&self, frame: char) -> String {
        match &self.latest {
            None => format!("{} Starting scan", frame),
            Some(p) if p.eta > 0 => format!(
                "{} {:>3.0}% {} (about {}s left)",
                frame, p.percentage, p.current_stage, p.eta
            ),
            Some(p) => format!("{} {:>3.0}% {}", frame, p.percentage, p.current_stage),
        }
    }

    pub fn finish(&self) {
        if self.enabled {
            eprint!("\r\x1b[2K");
            let _ = std::io::stderr().flush();
        }
    }
}

/// Follow `scan_id` on `events` until it completes or is cancelled
pub async fn watch_scan(
    mut events: EventReceiver,
    scan_id: &str,
    mut line: ProgressLine,
) -> Result<ScanOutcome, ProgressError> {
    let mut redraw = interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    line.finish();
                    return Err(ProgressError::StreamClosed { scan_id: scan_id.to_string() });
                };
                let Event::Scan(event) = event else { continue };
                if event.scan_id != scan_id {
                    continue;
                }
                if let Some(outcome) = handle_scan_event(event, &mut line) {
                    line.finish();
                    return Ok(outcome);
                }
            }
            _ = redraw.tick() => line.tick(),
        }
    }
}

fn handle_scan_event(event: ScanEvent, line: &mut ProgressLine) -> Option<ScanOutcome> {
    match event.event_type {
        ScanEventType::Progress => {
            if let Some(progress) = event.progress {
                line.update(progress);
            }
            None
        }
        ScanEventType::Warning => {
            if let Some(message) = event.message {
                log::info!("Scan {}: {}", event.scan_id, message);
            }
            None
        }
        ScanEventType::Started => None,
        ScanEventType::Completed => match event.result {
            Some(result) => Some(ScanOutcome::Completed(result)),
            None => {
                log::debug!("Completion event for {} carried no result", event.scan_id);
                None
            }
        },
        ScanEventType::Cancelled => Some(ScanOutcome::Cancelled(event.progress)),
    }
}
