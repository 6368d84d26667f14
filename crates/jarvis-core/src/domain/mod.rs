//! Domain types for the session layer.
//!
//! These types are free of infrastructure concerns: no file paths, no
//! channels, no backend handles.

pub mod conversation;
pub mod message;
pub mod voice;

pub use conversation::{
    CONVERSATION_EXTENSION, ConversationId, MessageRole, TIMESTAMP_FORMAT, TitleResult, Turn,
    UNTITLED_TITLE,
};
pub use message::{Message, MessageMeta};
pub use voice::VoiceState;

/// A label received at the notification boundary.
///
/// Backend labels (roles, state names) are parsed into a closed enum. Values
/// the orchestrator does not know are kept verbatim in `Unknown` so callers
/// can log them instead of guessing a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireLabel<T> {
    /// A recognised label.
    Known(T),
    /// An unrecognised label, preserved as received.
    Unknown(String),
}
