//! Conversation store port definition.
//!
//! This port defines the interface for persisting conversations as ordered
//! sequences of turns. Implementations own naming, id validation, and the
//! atomicity of writes.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ConversationId, TitleResult, Turn};

/// Errors that can occur in conversation store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Invalid conversation id: {0}")]
    InvalidId(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Storage error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether this error means the conversation does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Port for conversation persistence.
///
/// # Design Rules
///
/// - Turns are append-only and ordered by append order
/// - `delete` is idempotent
/// - `append` never creates a conversation
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// List all conversations, most recently modified first.
    async fn list(&self) -> Result<Vec<ConversationId>, StoreError>;

    /// Create an empty untitled conversation.
    async fn create(&self) -> Result<ConversationId, StoreError>;

    /// Read all turns of a conversation.
    async fn read(&self, id: &ConversationId) -> Result<Vec<Turn>, StoreError>;

    /// Append a turn to an existing conversation.
    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError>;

    /// Rename a conversation to a sanitised `title`.
    async fn rename(&self, id: &ConversationId, title: &str) -> Result<TitleResult, StoreError>;

    /// Delete a conversation. Deleting a missing conversation succeeds.
    async fn delete(&self, id: &ConversationId) -> Result<(), StoreError>;
}
