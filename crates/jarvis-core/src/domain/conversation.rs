//! Conversation domain types.
//!
//! A conversation is identified by the name of the file that holds it, so the
//! identity changes when the conversation is renamed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WireLabel;

/// Title given to freshly created conversations.
///
/// Ids starting with this title are considered untitled and are eligible for
/// automatic titling. The title is reserved: nothing may be renamed to it.
pub const UNTITLED_TITLE: &str = "New Conversation";

/// File extension of persisted conversations.
pub const CONVERSATION_EXTENSION: &str = "json";

/// `chrono` format of the timestamp stem embedded in every id.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Separator between the title and the timestamp stem.
const STEM_SEPARATOR: &str = " - ";

/// Identifier of a persisted conversation (`<title> - <timestamp>.json`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a raw file name.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build the id for `title` with the timestamp `stem`.
    pub fn compose(title: &str, stem: &str) -> Self {
        Self(format!(
            "{title}{STEM_SEPARATOR}{stem}.{CONVERSATION_EXTENSION}"
        ))
    }

    /// Borrow the raw file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its `.json` extension.
    pub fn file_stem(&self) -> &str {
        self.0
            .strip_suffix(CONVERSATION_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(&self.0)
    }

    /// Whether this conversation still carries the untitled marker.
    pub fn is_untitled(&self) -> bool {
        self.0.starts_with(UNTITLED_TITLE)
            && self.0[UNTITLED_TITLE.len()..].starts_with(STEM_SEPARATOR)
    }

    /// Title part of the id (everything before the last ` - `).
    pub fn title(&self) -> &str {
        let stem = self.file_stem();
        stem.rfind(STEM_SEPARATOR).map_or(stem, |idx| &stem[..idx])
    }

    /// Timestamp part of the id (everything after the last ` - `).
    ///
    /// Returns `None` for ids that were not produced by [`Self::compose`].
    pub fn timestamp_stem(&self) -> Option<&str> {
        let stem = self.file_stem();
        stem.rfind(STEM_SEPARATOR)
            .map(|idx| &stem[idx + STEM_SEPARATOR.len()..])
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ConversationId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Parse a role label received from the backend.
    pub fn parse(label: &str) -> WireLabel<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "system" => WireLabel::Known(Self::System),
            "user" => WireLabel::Known(Self::User),
            "assistant" => WireLabel::Known(Self::Assistant),
            _ => WireLabel::Unknown(label.to_string()),
        }
    }

    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
    /// Milliseconds since the Unix epoch, as supplied by whoever produced it.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Turn {
    /// Create a new turn.
    pub fn new(role: MessageRole, content: impl Into<String>, created_at: i64) -> Self {
        Self {
            role,
            content: content.into(),
            created_at,
        }
    }
}

/// Result of renaming a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleResult {
    /// The conversation's id after the rename.
    #[serde(rename = "new_filename")]
    pub new_id: ConversationId,
    /// The sanitised title that was applied.
    pub title: String,
}
