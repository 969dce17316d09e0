//! NotificationManager implementation
//!
//! Fan-out over unbounded channels. Publishing never waits on a subscriber:
//! each event is pushed into every matching channel and subscribers whose
//! receiver has gone away are pruned on the spot.

use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::sync::{read_recovering, write_or, write_recovering};
use crate::notifications::error::NotificationError;
use crate::notifications::event::{Event, EventFilter};
use crate::notifications::traits::{EventSink, SubscriberStatistics};

pub type EventReceiver = UnboundedReceiver<Event>;

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<Event>,
    statistics: SubscriberStatistics,
}

#[derive(Default)]
pub struct NotificationManager {
    subscribers: RwLock<HashMap<String, SubscriberInfo>>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        subscriber_id: String,
        filter: EventFilter,
        source: String,
    ) -> Result<EventReceiver, NotificationError> {
        let (sender, receiver) = unbounded_channel();

        let subscriber_info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
            statistics: SubscriberStatistics::new(),
        };

        let mut subscribers = write_or(&self.subscribers, "subscribers", |message| {
            NotificationError::Synchronisation { message }
        })?;

        // Warn if overwriting existing subscriber
        if let Some(existing) = subscribers.insert(subscriber_id.clone(), subscriber_info) {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        } else {
            log::trace!("Subscriber '{}' registered from {}", subscriber_id, source);
        }

        Ok(receiver)
    }

    pub fn unsubscribe(&self, subscriber_id: &str) -> bool {
        write_recovering(&self.subscribers, "subscribers")
            .remove(subscriber_id)
            .is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        read_recovering(&self.subscribers, "subscribers").len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        read_recovering(&self.subscribers, "subscribers").contains_key(subscriber_id)
    }

    /// Events delivered to a subscriber so far
    pub fn delivered_count(&self, subscriber_id: &str) -> Option<usize> {
        read_recovering(&self.subscribers, "subscribers")
            .get(subscriber_id)
            .map(|info| info.statistics.delivered())
    }

    pub fn publish(&self, event: Event) -> Result<(), NotificationError> {
        let mut failed_subscribers = Vec::new();
        let mut subscribers = write_recovering(&self.subscribers, "subscribers");

        for (subscriber_id, subscriber_info) in subscribers.iter() {
            if !subscriber_info.filter.accepts(&event) {
                continue;
            }
            if subscriber_info.sender.send(event.clone()).is_ok() {
                subscriber_info.statistics.record_delivery();
            } else {
                // Receiver dropped
                failed_subscribers.push(subscriber_id.clone());
            }
        }

        for subscriber_id in &failed_subscribers {
            subscribers.remove(subscriber_id);
            log::debug!("Removed subscriber '{}' with closed channel", subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type: event.channel().to_string(),
                failed_subscribers,
            });
        }

        Ok(())
    }
}

impl EventSink for NotificationManager {
    fn emit(&self, event: Event) -> Result<(), NotificationError> {
        self.publish(event)
    }
}
