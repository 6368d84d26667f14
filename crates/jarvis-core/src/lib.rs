//! Core domain types and port definitions for the jarvis session layer.
//!
//! This crate has no I/O of its own. Adapters (`jarvis-store`, backend
//! bridges) implement the traits in [`ports`]; `jarvis-session` consumes them.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, InputMode, validate_config};
pub use domain::{
    ConversationId, Message, MessageMeta, MessageRole, TitleResult, Turn, UNTITLED_TITLE,
    VoiceState, WireLabel,
};
pub use events::{BackendEvent, SessionEvent, TransitionCause, WireError};
pub use ports::{
    BackendError, ChannelEmitter, Clock, ConfigStore, ConversationStore, FixedClock,
    SessionEventEmitter, StoreError, SystemClock, VoiceBackend,
};
