//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the session layer expects from
//! infrastructure. They contain no implementation details and use only domain
//! types.
//!
//! # Design Rules
//!
//! - No filesystem paths in any signature
//! - Store traits are minimal and CRUD-focused
//! - The backend port is command-only; notifications arrive as events

pub mod backend;
pub mod clock;
pub mod config_store;
pub mod conversation_store;
pub mod event_emitter;

pub use backend::{BackendError, VoiceBackend};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config_store::ConfigStore;
pub use conversation_store::{ConversationStore, StoreError};
pub use event_emitter::{ChannelEmitter, SessionEventEmitter};
