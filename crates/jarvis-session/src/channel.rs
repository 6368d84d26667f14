//! Backend notification channel.
//!
//! All notification kinds share one FIFO so receipt order is preserved.
//! Every notification is stamped with the subscription generation current
//! when it was published; the coordinator compares that stamp with its
//! [`Subscription`] to tell events for the active conversation from events
//! published before a switch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use jarvis_core::domain::ConversationId;
use jarvis_core::events::BackendEvent;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Subscription generation counter value.
pub type Generation = u64;

/// A notification stamped with the generation it was published under.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: Generation,
    pub event: BackendEvent,
}

#[derive(Debug, Default)]
struct Generations {
    current: AtomicU64,
}

impl Generations {
    fn current(&self) -> Generation {
        self.current.load(Ordering::SeqCst)
    }

    fn advance(&self) -> Generation {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Advance only if `generation` is still current.
    fn revoke(&self, generation: Generation) -> bool {
        self.current
            .compare_exchange(generation, generation + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Subscription side of the channel, owned by the coordinator.
#[derive(Debug)]
pub struct EventChannel {
    tx: mpsc::UnboundedSender<Envelope>,
    generations: Arc<Generations>,
}

/// Receiving side of the channel, owned by whoever drives the coordinator.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl EventChannel {
    /// Create a channel and the stream its notifications arrive on.
    pub fn new() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            tx,
            generations: Arc::new(Generations::default()),
        };
        (channel, EventStream { rx })
    }

    /// A handle the backend adapter uses to publish notifications.
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            tx: self.tx.clone(),
            generations: Arc::clone(&self.generations),
        }
    }

    /// Start a new subscription for `conversation`.
    ///
    /// Every previously issued subscription becomes stale.
    pub fn subscribe(&self, conversation: ConversationId) -> Subscription {
        let generation = self.generations.advance();
        trace!(generation, conversation = %conversation, "Subscribed");
        Subscription {
            generation,
            conversation,
            generations: Arc::clone(&self.generations),
        }
    }

    pub fn current_generation(&self) -> Generation {
        self.generations.current()
    }
}

impl EventStream {
    /// Wait for the next notification.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Take the next notification if one is queued.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

/// Cloneable publishing handle.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<Envelope>,
    generations: Arc<Generations>,
}

impl EventPublisher {
    /// Publish a decoded notification. Returns `false` once the stream is gone.
    pub fn publish(&self, event: BackendEvent) -> bool {
        let envelope = Envelope {
            generation: self.generations.current(),
            event,
        };
        self.tx.send(envelope).is_ok()
    }

    /// Decode and publish a named wire notification.
    ///
    /// Unknown names and malformed payloads are logged and dropped.
    pub fn publish_wire(&self, name: &str, payload: Value) -> bool {
        match BackendEvent::from_wire(name, payload) {
            Ok(event) => self.publish(event),
            Err(e) => {
                warn!(event = name, error = %e, "Dropping backend notification");
                false
            }
        }
    }
}

/// The coordinator's claim on notifications for one conversation.
///
/// Dropping the handle revokes it: notifications published afterwards no
/// longer carry its generation.
#[derive(Debug)]
pub struct Subscription {
    generation: Generation,
    conversation: ConversationId,
    generations: Arc<Generations>,
}

impl Subscription {
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    pub const fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// Whether `envelope` was published under this subscription.
    pub const fn covers(&self, envelope: &Envelope) -> bool {
        envelope.generation == self.generation
    }

    /// Point the subscription at the renamed id of the same conversation.
    pub fn retarget(&mut self, conversation: ConversationId) {
        self.conversation = conversation;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.generations.revoke(self.generation) {
            trace!(generation = self.generation, "Subscription revoked");
        }
    }
}
