//! Change notifications sent from the session layer to presentation.

use serde::{Deserialize, Serialize};

use crate::domain::{ConversationId, Message, MessageMeta, VoiceState};

/// What caused a voice state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// A `state-changed` notification from the backend.
    Backend,
    /// A start or stop request acknowledged by the backend.
    Request,
    /// The liveness poll found the backend stopped.
    LivenessPoll,
}

/// Session layer events consumed by presentation.
///
/// Each variant is self-describing; presentation can also call for a full
/// snapshot at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The voice state changed.
    VoiceStateChanged {
        from: VoiceState,
        to: VoiceState,
        cause: TransitionCause,
    },

    /// A different conversation is now active.
    ActiveConversationChanged {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
    },

    /// The history index was re-listed.
    HistoryChanged {
        conversations: Vec<ConversationId>,
    },

    /// A message was added to the active conversation.
    MessageAppended {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        message: Message,
    },

    /// Meta was merged into an assistant message.
    MessageMetaMerged {
        #[serde(rename = "conversationId")]
        conversation_id: ConversationId,
        #[serde(rename = "createdAt")]
        created_at: i64,
        meta: MessageMeta,
    },

    /// Model download progress (0–100).
    DownloadProgress { percent: u8 },

    /// The model download finished.
    DownloadComplete,

    /// Informational text for the user.
    Notice { message: String },

    /// A failure the user should see.
    Error { message: String },
}

impl SessionEvent {
    /// Create a notice event.
    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice {
            message: message.into(),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Short name of the variant, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::VoiceStateChanged { .. } => "voice_state_changed",
            Self::ActiveConversationChanged { .. } => "active_conversation_changed",
            Self::HistoryChanged { .. } => "history_changed",
            Self::MessageAppended { .. } => "message_appended",
            Self::MessageMetaMerged { .. } => "message_meta_merged",
            Self::DownloadProgress { .. } => "download_progress",
            Self::DownloadComplete => "download_complete",
            Self::Notice { .. } => "notice",
            Self::Error { .. } => "error",
        }
    }
}
