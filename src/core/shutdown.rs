//! Signal-driven shutdown coordination
//!
//! The binary installs one [`ShutdownCoordinator`] per process. The first
//! SIGINT/SIGTERM/SIGHUP/SIGQUIT cancels the coordinator's token, which the
//! orchestrator's root token is derived from, so every running scan sees a
//! cooperative cancellation. A second signal exits immediately with 130.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Exit code used when the process is interrupted
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Turns process signals into token cancellation
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    signal_count: Arc<AtomicUsize>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            signal_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Token cancelled on the first shutdown request
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request shutdown programmatically
    pub fn trigger_shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Record one received signal; returns true when this is a repeat signal
    fn record_signal(&self) -> bool {
        let previous = self.signal_count.fetch_add(1, Ordering::AcqRel);
        self.token.cancel();
        previous >= 1
    }

    /// Spawn signal listeners on the current tokio runtime
    pub fn install_signal_handlers(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            // Let writes to a closed pipe terminate quietly instead of panicking
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            let kinds = [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::hangup(),
                SignalKind::quit(),
            ];

            for kind in kinds {
                let coordinator = self.clone();
                tokio::spawn(async move {
                    let Ok(mut stream) = signal(kind) else {
                        log::debug!("Could not install handler for {:?}", kind);
                        return;
                    };
                    while stream.recv().await.is_some() {
                        if coordinator.record_signal() {
                            log::warn!("Second interrupt received; exiting");
                            std::process::exit(INTERRUPTED_EXIT_CODE);
                        }
                        log::info!("Shutdown requested; cancelling running scans");
                    }
                });
            }
        }

        #[cfg(not(unix))]
        {
            let coordinator = self.clone();
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if coordinator.record_signal() {
                        std::process::exit(INTERRUPTED_EXIT_CODE);
                    }
                    log::info!("Shutdown requested; cancelling running scans");
                }
            });
        }
    }
}
