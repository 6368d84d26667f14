//! Notifications pushed by the voice backend.
//!
//! The backend emits named notifications with a JSON payload. This module
//! decodes them into [`BackendEvent`]; everything past this point works with
//! typed values only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Message, MessageMeta, MessageRole, WireLabel};

/// Wire name of voice state notifications.
pub const STATE_CHANGED: &str = "jarvis-state-changed";
/// Wire name of message notifications.
pub const NEW_MESSAGE: &str = "new-message";
/// Wire name of meta attachments.
pub const MESSAGE_META: &str = "message-meta";
/// Wire name of model download progress ticks.
pub const DOWNLOAD_PROGRESS: &str = "whisper-download-progress";
/// Wire name of model download completion.
pub const DOWNLOAD_COMPLETE: &str = "whisper-download-complete";

/// Errors decoding a backend notification.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Unknown notification: {0}")]
    UnknownEvent(String),

    #[error("Malformed {event} payload: {source}")]
    Malformed {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A `new-message` payload.
///
/// The role is kept as received; the coordinator decides what to do with
/// labels it does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl NewMessagePayload {
    /// Convert into a [`Message`], or return the unrecognised role label.
    pub fn into_message(self) -> Result<Message, String> {
        match MessageRole::parse(&self.role) {
            WireLabel::Known(role) => Ok(Message {
                id: self.id,
                role,
                content: self.content,
                created_at: self.created_at,
                meta: self.meta,
            }),
            WireLabel::Unknown(label) => Err(label),
        }
    }
}

impl From<Message> for NewMessagePayload {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role.as_str().to_string(),
            content: message.content,
            created_at: message.created_at,
            meta: message.meta,
        }
    }
}

/// A `message-meta` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetaPayload {
    /// `createdAt` of the assistant message the meta belongs to.
    pub created_at_of_assistant: i64,
    pub meta: MessageMeta,
}

/// A download progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgressPayload {
    pub downloaded: u64,
    pub total: u64,
    #[serde(default)]
    pub percent: f64,
}

impl DownloadProgressPayload {
    /// Progress as a whole percentage in `0..=100`.
    ///
    /// Derived from the byte counts when `total` is known, so rounding in the
    /// reported `percent` does not matter.
    #[allow(clippy::cast_precision_loss)]
    pub fn clamped_percent(&self) -> u8 {
        let raw = if self.total > 0 {
            (self.downloaded as f64 / self.total as f64) * 100.0
        } else {
            self.percent
        };
        if raw.is_nan() {
            return 0;
        }
        // Clamped to 0..=100 first, so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = raw.round().clamp(0.0, 100.0) as u8;
        percent
    }
}

/// A decoded backend notification.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// The pipeline changed phase. The label is parsed by the state machine.
    StateChanged { label: String },
    NewMessage(NewMessagePayload),
    MessageMeta(MessageMetaPayload),
    DownloadProgress(DownloadProgressPayload),
    DownloadComplete,
}

impl BackendEvent {
    /// Decode a notification from its wire name and JSON payload.
    pub fn from_wire(name: &str, payload: Value) -> Result<Self, WireError> {
        match name {
            STATE_CHANGED => {
                // The pipeline sends a bare string; `{ "state": ... }` is accepted too.
                let label = match payload {
                    Value::String(label) => label,
                    Value::Object(mut map) => match map.remove("state") {
                        Some(Value::String(label)) => label,
                        _ => return Err(malformed(STATE_CHANGED, "expected a state label")),
                    },
                    _ => return Err(malformed(STATE_CHANGED, "expected a state label")),
                };
                Ok(Self::StateChanged { label })
            }
            NEW_MESSAGE => decode(NEW_MESSAGE, payload).map(Self::NewMessage),
            MESSAGE_META => decode(MESSAGE_META, payload).map(Self::MessageMeta),
            DOWNLOAD_PROGRESS => decode(DOWNLOAD_PROGRESS, payload).map(Self::DownloadProgress),
            DOWNLOAD_COMPLETE => Ok(Self::DownloadComplete),
            other => Err(WireError::UnknownEvent(other.to_string())),
        }
    }

    /// Wire name of this notification.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => STATE_CHANGED,
            Self::NewMessage(_) => NEW_MESSAGE,
            Self::MessageMeta(_) => MESSAGE_META,
            Self::DownloadProgress(_) => DOWNLOAD_PROGRESS,
            Self::DownloadComplete => DOWNLOAD_COMPLETE,
        }
    }

    /// Shorthand for a state change notification.
    pub fn state_changed(label: impl Into<String>) -> Self {
        Self::StateChanged {
            label: label.into(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    event: &'static str,
    payload: Value,
) -> Result<T, WireError> {
    serde_json::from_value(payload).map_err(|source| WireError::Malformed { event, source })
}

fn malformed(event: &'static str, reason: &str) -> WireError {
    use serde::de::Error as _;
    WireError::Malformed {
        event,
        source: serde_json::Error::custom(reason),
    }
}
