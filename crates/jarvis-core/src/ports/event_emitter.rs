//! Event emitter trait for session-to-presentation notifications.
//!
//! This module defines the abstraction for emitting session events.
//! Implementations handle transport details (channels, IPC, logging, etc.).

use tokio::sync::mpsc;

use crate::events::SessionEvent;

/// Trait for emitting session events.
///
/// `ChannelEmitter` forwards into a tokio channel; the CLI logs them instead.
pub trait SessionEventEmitter: Send + Sync {
    /// Emit a session event. Must not block.
    fn emit(&self, event: SessionEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn SessionEventEmitter>;
}

/// Emitter that forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionEventEmitter for ChannelEmitter {
    fn emit(&self, event: SessionEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            tracing::trace!(kind, "Session event dropped: no listener");
        }
    }

    fn clone_box(&self) -> Box<dyn SessionEventEmitter> {
        Box::new(self.clone())
    }
}
