//! Typed event bus for store events.
//!
//! Uses tokio broadcast channels to decouple the code performing writes
//! from the trigger handlers reacting to them. Any writer can emit events
//! without knowing who is listening, and any number of subscribers can
//! independently consume events.

use std::sync::Arc;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Store-level events that flow through the event bus.
///
/// Creation events mirror what the hosting platform delivers to trigger
/// handlers: the created document's path and field map. Erasure events are
/// emitted by the account eraser for observers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A document was created in the store.
    DocumentCreated {
        path: String,
        fields: Value,
    },
    /// A user's data was fully erased.
    UserErased {
        user_id: String,
        documents_removed: usize,
        objects_removed: usize,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Designed for fan-out delivery: every subscriber gets every event.
/// Slow subscribers that fall behind will receive a `Lagged` error
/// and may miss events, which is acceptable for advisory consumers.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<StoreEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    ///
    /// A capacity of 256 is recommended. Events beyond this limit will
    /// cause slow subscribers to lag and miss events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive store events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: StoreEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => {
                debug!("event_bus: emitted {label} to {count} subscriber(s)");
            }
            Err(_) => {
                debug!("event_bus: no subscribers for {label}");
            }
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Human-readable label for an event (for logging).
fn event_label(event: &StoreEvent) -> &'static str {
    match event {
        StoreEvent::DocumentCreated { .. } => "DocumentCreated",
        StoreEvent::UserErased { .. } => "UserErased",
    }
}
