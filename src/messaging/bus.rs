/// Bus for pub/sub form change notification
///
/// The form layer broadcasts change events here; the wizard (and any
/// other observer) subscribes and drains its receiver at its own pace.
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use super::events::FormEvent;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(SubscriberId, Sender<FormEvent>)>,
}

/// Broadcast bus for form change events
#[derive(Clone, Default)]
pub struct FormBus {
    registry: Arc<Mutex<Registry>>,
}

impl FormBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<FormEvent>, SubscriberId) {
        let (tx, rx) = unbounded();

        let mut registry = self.registry.lock();
        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, tx));

        (rx, id)
    }

    /// Unsubscribe from events
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.registry.lock().entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Publish an event to all subscribers, non-blocking.
    /// A subscriber whose receiver was dropped is simply skipped.
    pub fn publish(&self, event: FormEvent) {
        let registry = self.registry.lock();
        for (_, sender) in registry.entries.iter() {
            let _ = sender.try_send(event.clone());
        }
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().entries.len()
    }
}
