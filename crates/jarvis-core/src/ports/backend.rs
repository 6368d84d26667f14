//! Voice backend port: the command side of the native pipeline.
//!
//! # Design Rules
//!
//! - Commands only. Notifications travel the other way through the session
//!   event channel as [`BackendEvent`](crate::events::BackendEvent)s.
//! - Every call is independent and individually retryable.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ConversationId;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors returned by `VoiceBackend` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request (bad credentials, already running...).
    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    /// Unexpected internal error.
    #[error("Internal backend error: {0}")]
    Internal(String),
}

// ── Port trait ────────────────────────────────────────────────────────────────

/// Port trait for the native voice pipeline.
#[async_trait]
pub trait VoiceBackend: Send + Sync {
    /// Start the wake-word loop. Returns once the backend accepted the start.
    async fn start_voice_session(&self) -> Result<(), BackendError>;

    /// Stop the voice loop.
    async fn stop_voice_session(&self) -> Result<(), BackendError>;

    /// Whether the voice loop is running.
    async fn session_status(&self) -> Result<bool, BackendError>;

    /// Send a typed prompt. Returns the backend acknowledgement.
    async fn send_text_prompt(&self, prompt: &str) -> Result<String, BackendError>;

    /// Produce a short title for a conversation seed.
    async fn generate_title(&self, seed: &str) -> Result<String, BackendError>;

    /// Tell the backend which conversation provides LLM context.
    async fn set_active_conversation(&self, id: &ConversationId) -> Result<(), BackendError>;

    /// Names of the available microphones.
    async fn list_input_devices(&self) -> Result<Vec<String>, BackendError>;

    /// Names of the available speakers.
    async fn list_output_devices(&self) -> Result<Vec<String>, BackendError>;
}
