//! Public API for the notification system
//!
//! External modules should import from here rather than directly from
//! internal modules. There is no global instance: the binary creates one
//! [`NotificationManager`] and hands it to the scan orchestrator as its
//! [`EventSink`].

// Core event types and enums
pub use crate::notifications::event::{
    Event, EventFilter, ScanEvent, ScanEventType, SystemEvent, SystemEventType,
};

// Manager and utilities
pub use crate::notifications::error::NotificationError;
pub use crate::notifications::manager::{EventReceiver, NotificationManager};

// Traits and statistics
pub use crate::notifications::traits::{EventSink, SubscriberStatistics};
