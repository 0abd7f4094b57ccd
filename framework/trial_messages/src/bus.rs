//! Synchronous publish/subscribe.
//!
//! Subscribers register per [`MessageKind`]. Publishing invokes every
//! subscriber for the message's kind in registration order, on the
//! publishing thread. There is no queue; ordering and back-pressure belong
//! to the publisher.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::{Message, MessageKind};

/// Receiver of lifecycle messages.
pub trait MessageSink: Send + Sync {
    fn on_message(&self, message: &Message);
}

impl<F> MessageSink for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn on_message(&self, message: &Message) {
        self(message);
    }
}

type Subscribers = Vec<Arc<dyn MessageSink>>;

/// Registry of message kind to ordered subscribers.
#[derive(Default)]
pub struct MessageBus {
    registry: RwLock<FxHashMap<MessageKind, Subscribers>>,
}

impl MessageBus {
    pub fn new() -> Self {
        MessageBus::default()
    }

    pub fn subscribe(&self, kind: MessageKind, sink: Arc<dyn MessageSink>) {
        self.registry.write().entry(kind).or_default().push(sink);
    }

    /// Register `sink` for each of `kinds`.
    pub fn subscribe_kinds(&self, kinds: &[MessageKind], sink: &Arc<dyn MessageSink>) {
        let mut registry = self.registry.write();
        for kind in kinds {
            registry.entry(*kind).or_default().push(Arc::clone(sink));
        }
    }

    /// Register `sink` for every kind.
    pub fn subscribe_all(&self, sink: Arc<dyn MessageSink>) {
        self.subscribe_kinds(&MessageKind::ALL, &sink);
    }

    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.registry.read().get(&kind).map_or(0, Vec::len)
    }

    pub fn publish(&self, message: &Message) {
        // Snapshot so subscribers may publish or subscribe re-entrantly.
        let subscribers: Subscribers = match self.registry.read().get(&message.kind()) {
            Some(subscribers) => subscribers.clone(),
            None => return,
        };
        for subscriber in &subscribers {
            subscriber.on_message(message);
        }
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("MessageBus")
            .field("kinds", &registry.len())
            .finish_non_exhaustive()
    }
}

/// Sink that keeps every message it receives. Handy for assertions.
#[derive(Debug, Default)]
pub struct MessageRecorder {
    messages: Mutex<Vec<Message>>,
}

impl MessageRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(MessageRecorder::default())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    pub fn kinds(&self) -> Vec<MessageKind> {
        self.messages.lock().iter().map(Message::kind).collect()
    }

    pub fn of_kind(&self, kind: MessageKind) -> Vec<Message> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.kind() == kind)
            .cloned()
            .collect()
    }
}

impl MessageSink for MessageRecorder {
    fn on_message(&self, message: &Message) {
        self.messages.lock().push(message.clone());
    }
}
