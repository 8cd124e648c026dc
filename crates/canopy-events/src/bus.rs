//! Event bus for broadcasting events to subscribers.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::{EventMetadata, ShellEvent, TransportFailure};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus for broadcasting events to all subscribers.
///
/// One bus is shared by the whole session: the application registry, every
/// running instance and the shell itself publish to and read from the same
/// channel. Clones share the underlying sender.
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<Arc<ShellEvent>>,
    /// Channel capacity.
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    pub fn publish(&self, event: ShellEvent) -> usize {
        let event = Arc::new(event);

        trace!(event_type = %event.event_type(), "Publishing event");

        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(
                event_type = %event.event_type(),
                receiver_count = count,
                "Event published"
            );
            count
        } else {
            // No receivers - this is fine
            trace!(event_type = %event.event_type(), "No receivers for event");
            0
        }
    }

    /// Publish a transport failure on the shared error channel.
    pub fn report_failure(&self, source: &str, failure: TransportFailure) -> usize {
        warn!(
            source,
            operation = %failure.operation,
            status = ?failure.status,
            message = %failure.message,
            "Remote call failed"
        );
        self.publish(ShellEvent::TransportError {
            metadata: EventMetadata::new(source),
            failure,
        })
    }

    /// Subscribe to all events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), ReceiverFilter::All)
    }

    /// Subscribe to broadcast events matching a topic pattern.
    ///
    /// The pattern can be an exact match (e.g. `explorer.item-renamed`)
    /// or a trailing wildcard (e.g. `explorer.*`). Non-broadcast events
    /// are filtered out.
    #[must_use]
    pub fn subscribe_topic(&self, topic_pattern: impl Into<String>) -> EventReceiver {
        EventReceiver::new(
            self.sender.subscribe(),
            ReceiverFilter::Topic(topic_pattern.into()),
        )
    }

    /// Subscribe to the transport-error channel only.
    #[must_use]
    pub fn subscribe_errors(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), ReceiverFilter::Errors)
    }

    /// Get the current number of active receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum ReceiverFilter {
    All,
    Topic(String),
    Errors,
}

/// Receiver for events from the event bus.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<ShellEvent>>,
    filter: ReceiverFilter,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<Arc<ShellEvent>>, filter: ReceiverFilter) -> Self {
        Self { receiver, filter }
    }

    fn matches(&self, event: &ShellEvent) -> bool {
        match &self.filter {
            ReceiverFilter::All => true,
            ReceiverFilter::Errors => event.as_transport_error().is_some(),
            ReceiverFilter::Topic(pattern) => {
                let Some(broadcast) = event.as_broadcast() else {
                    return false;
                };
                if let Some(prefix) = pattern.strip_suffix('*') {
                    broadcast.topic.starts_with(prefix)
                } else {
                    broadcast.topic == *pattern
                }
            },
        }
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once the bus has been dropped. Events dropped because
    /// the receiver lagged are logged and skipped.
    pub async fn recv(&mut self) -> Option<Arc<ShellEvent>> {
        let mut skipped: usize = 0;
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                    skipped = skipped.wrapping_add(1);
                    if skipped.is_multiple_of(100) {
                        tokio::task::yield_now().await;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive the next matching event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<ShellEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PlatformEvent;
    use canopy_core::InstanceId;
    use serde_json::json;

    fn broadcast(topic: &str) -> ShellEvent {
        ShellEvent::Broadcast {
            metadata: EventMetadata::new("test"),
            event: PlatformEvent::new(topic, json!({})),
        }
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let count = bus.publish(broadcast("shell.ready"));
        assert_eq!(count, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "broadcast");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        assert_eq!(bus.publish(broadcast("a")), 2);

        assert_eq!(receiver1.recv().await.unwrap().event_type(), "broadcast");
        assert_eq!(receiver2.recv().await.unwrap().event_type(), "broadcast");
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(broadcast("a")), 0);
    }

    #[tokio::test]
    async fn test_cloned_bus_shares_channel() {
        let bus = EventBus::new();
        let cloned = bus.clone();
        let mut receiver = cloned.subscribe();

        bus.publish(broadcast("a"));
        assert!(receiver.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_topic_subscription_exact() {
        let bus = EventBus::new();
        let mut all_receiver = bus.subscribe();
        let mut specific = bus.subscribe_topic("explorer.item-renamed");

        bus.publish(broadcast("explorer.item-renamed"));
        assert!(all_receiver.try_recv().is_some());
        assert!(specific.try_recv().is_some());

        bus.publish(broadcast("explorer.item-deleted"));
        assert!(all_receiver.try_recv().is_some());
        assert!(specific.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_topic_subscription_wildcard() {
        let bus = EventBus::new();
        let mut wildcard = bus.subscribe_topic("explorer.*");

        bus.publish(broadcast("explorer.item-renamed"));
        bus.publish(broadcast("desktop.theme"));

        let received = wildcard.try_recv().unwrap();
        assert_eq!(
            received.as_broadcast().unwrap().topic,
            "explorer.item-renamed"
        );
        assert!(wildcard.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_topic_subscription_ignores_lifecycle_events() {
        let bus = EventBus::new();
        let mut specific = bus.subscribe_topic("explorer.*");

        bus.publish(ShellEvent::InstanceFocused {
            metadata: EventMetadata::new("test"),
            instance_id: InstanceId::new(),
        });

        assert!(specific.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_error_subscription() {
        let bus = EventBus::new();
        let mut errors = bus.subscribe_errors();

        bus.publish(broadcast("a"));
        bus.report_failure("requests", TransportFailure::new("get_favorites", "boom"));

        let event = errors.try_recv().unwrap();
        assert_eq!(
            event.as_transport_error().unwrap().operation,
            "get_favorites"
        );
        assert!(errors.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_bus_dropped() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }
}
