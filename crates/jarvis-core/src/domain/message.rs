//! In-memory message projection.

use serde::{Deserialize, Serialize};

use super::conversation::{MessageRole, Turn};

/// Metrics attached to an assistant message, possibly after it was shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMeta {
    /// Rough token estimate of the spoken reply (~4 chars per token).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_tokens_est: Option<u64>,
    /// Characters sent to the TTS engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_chars: Option<u64>,
    /// Wake-to-end-of-speech latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl MessageMeta {
    /// Fold `update` into `self`; fields present in `update` win.
    pub const fn merge(&mut self, update: Self) {
        if update.tts_tokens_est.is_some() {
            self.tts_tokens_est = update.tts_tokens_est;
        }
        if update.tts_chars.is_some() {
            self.tts_chars = update.tts_chars;
        }
        if update.latency_ms.is_some() {
            self.latency_ms = update.latency_ms;
        }
    }

    /// Whether no field is set.
    pub const fn is_empty(&self) -> bool {
        self.tts_tokens_est.is_none() && self.tts_chars.is_none() && self.latency_ms.is_none()
    }
}

/// A turn as shown to presentation, plus transient fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Backend-assigned id, when the backend supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl Message {
    /// Attach (or merge) metadata onto this message.
    pub fn attach_meta(&mut self, update: MessageMeta) {
        match self.meta.as_mut() {
            Some(meta) => meta.merge(update),
            None => self.meta = Some(update),
        }
    }

    /// The persistable part of this message.
    pub fn to_turn(&self) -> Turn {
        Turn::new(self.role, self.content.clone(), self.created_at)
    }
}

impl From<Turn> for Message {
    fn from(turn: Turn) -> Self {
        Self {
            id: None,
            role: turn.role,
            content: turn.content,
            created_at: turn.created_at,
            meta: None,
        }
    }
}
