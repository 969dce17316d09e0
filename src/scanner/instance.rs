//! Live state of one running scan
//!
//! A [`ScanInstance`] is shared between the registry, status callers and the
//! pipeline task that executes the scan. Only that task writes progress and
//! the authoritative status; everyone else reads copies taken under the lock
//! or asks for cancellation.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::sync::{read_recovering, write_recovering};
use crate::scanner::config::ScanConfig;
use crate::scanner::types::{ScanProgress, ScanStatus, StatusRecord};

#[derive(Debug)]
struct InstanceState {
    status: ScanStatus,
    progress: ScanProgress,
}

#[derive(Debug)]
pub struct ScanInstance {
    id: String,
    url: Url,
    config: Arc<ScanConfig>,
    started_at: DateTime<Utc>,
    started: Instant,
    cancel: CancellationToken,
    state: RwLock<InstanceState>,
}

impl ScanInstance {
    pub(crate) fn new(
        id: String,
        url: Url,
        config: Arc<ScanConfig>,
        started: Instant,
        started_at: DateTime<Utc>,
        cancel: CancellationToken,
    ) -> Self {
        let progress = ScanProgress::new(config.total_tasks(), started_at);
        Self {
            id,
            url,
            config,
            started_at,
            started,
            cancel,
            state: RwLock::new(InstanceState {
                status: ScanStatus::Running,
                progress,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &Arc<ScanConfig> {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn status(&self) -> ScanStatus {
        read_recovering(&self.state, "scan instance").status
    }

    pub fn progress(&self) -> ScanProgress {
        read_recovering(&self.state, "scan instance").progress.clone()
    }

    /// Consistent copy of status and progress taken under one lock
    pub fn status_record(&self) -> StatusRecord {
        let state = read_recovering(&self.state, "scan instance");
        StatusRecord {
            id: self.id.clone(),
            status: state.status,
            progress: state.progress.clone(),
            url: self.url.to_string(),
            started_at: self.started_at,
        }
    }

    /// Signal cancellation and mark the status as a hint for pollers.
    ///
    /// The pipeline still performs the authoritative transition when it next
    /// checks its token. A scan that already reached a terminal state keeps it.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
        let mut state = write_recovering(&self.state, "scan instance");
        if !state.status.is_terminal() {
            state.status = ScanStatus::Cancelled;
        }
    }

    pub(crate) fn store_progress(&self, progress: ScanProgress) {
        write_recovering(&self.state, "scan instance").progress = progress;
    }

    pub(crate) fn set_status(&self, status: ScanStatus) {
        write_recovering(&self.state, "scan instance").status = status;
    }
}
