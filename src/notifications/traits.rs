//! Traits for the notification system

use crate::notifications::error::NotificationError;
use crate::notifications::event::Event;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiver of scan notifications.
///
/// `emit` must never block the caller. The engine logs and discards any
/// error it returns.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event) -> Result<(), NotificationError>;
}

/// Delivery statistics for a subscriber
#[derive(Debug, Default)]
pub struct SubscriberStatistics {
    delivered: AtomicUsize,
}

impl SubscriberStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }
}
