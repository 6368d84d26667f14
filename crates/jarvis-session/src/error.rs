//! Session error taxonomy.

use std::fmt;

use jarvis_core::domain::{ConversationId, VoiceState};
use jarvis_core::ports::{BackendError, StoreError};
use thiserror::Error;

/// A locally initiated voice request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRequest {
    Start,
    Stop,
}

impl fmt::Display for VoiceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// Errors from the voice state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceStateError {
    /// The request is not valid in the current state.
    #[error("Cannot {requested} the voice session while {from}")]
    InvalidRequest {
        from: VoiceState,
        requested: VoiceRequest,
    },

    /// The backend did not acknowledge the request.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors surfaced by the session coordinator.
///
/// Every failure leaves the voice state and the active conversation as they
/// were before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A credential is missing or invalid. The user has been notified.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A mutating store operation failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The backend failed; nothing changed and the call can be retried.
    #[error("Backend error: {0}")]
    TransientBackend(#[from] BackendError),

    /// The input was rejected before reaching any collaborator.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error(transparent)]
    Voice(VoiceStateError),

    /// The session runner is no longer running.
    #[error("Session runner has shut down")]
    Shutdown,
}

impl From<VoiceStateError> for SessionError {
    fn from(err: VoiceStateError) -> Self {
        match err {
            VoiceStateError::Backend(e) => Self::TransientBackend(e),
            other @ VoiceStateError::InvalidRequest { .. } => Self::Voice(other),
        }
    }
}
