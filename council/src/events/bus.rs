//! Progress sinks
//!
//! The orchestrator emits events synchronously through a [`ProgressSink`].
//! [`EventBus`] fans them out to any number of async subscribers using a
//! Tokio broadcast channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

use super::types::ProgressEvent;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Receives progress events from a running session.
///
/// `emit` must not block; it runs on the orchestrating task between turns.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Broadcast fan-out of progress events
pub struct EventBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ProgressEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            // No receivers is fine; progress is advisory
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for EventBus {
    fn emit(&self, event: ProgressEvent) {
        self.publish(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.recorded().clone()
    }

    // a panicking reader must not cost later events
    fn recorded(&self) -> MutexGuard<'_, Vec<ProgressEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(ProgressEvent::event_type).collect()
    }

    pub fn len(&self) -> usize {
        self.recorded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.recorded().push(event);
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn emit(&self, event: ProgressEvent) {
        (**self).emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    fn role() -> Role {
        Role::debater("optimist", "Optimist", "qwen2.5:7b", "Look on the bright side.")
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.emit(ProgressEvent::turn_started(&role(), 1, 0));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type(), "turn_started");
        assert_eq!(received.role_id(), "optimist");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new().shared();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ProgressEvent::turn_completed(&role(), 1, 0, 10));

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(ProgressEvent::synthesis_started(&Role::synthesizer(
            "juge", "Juge", "llama3.1:8b", "Decide.",
        )));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = Arc::new(RecordingSink::new());
        let dyn_sink: Arc<dyn ProgressSink> = sink.clone();
        dyn_sink.emit(ProgressEvent::turn_started(&role(), 1, 0));
        dyn_sink.emit(ProgressEvent::turn_completed(&role(), 1, 0, 3));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["turn_started", "turn_completed"]);
    }

    #[test]
    fn test_recording_sink_survives_poisoned_lock() {
        let sink = Arc::new(RecordingSink::new());
        sink.emit(ProgressEvent::turn_started(&role(), 1, 0));

        let poisoner = Arc::clone(&sink);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.events.lock().unwrap();
            panic!("reader panicked while holding the lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(sink.events.is_poisoned());

        sink.emit(ProgressEvent::turn_completed(&role(), 1, 0, 3));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["turn_started", "turn_completed"]);
    }

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(ProgressEvent::turn_started(&role(), 1, 0));
    }
}
