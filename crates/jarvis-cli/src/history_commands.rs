//! Conversation history subcommands.

use clap::{Subcommand, ValueEnum};
use jarvis_core::domain::MessageRole;

/// Role of an appended turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    User,
    Assistant,
    System,
}

impl From<RoleArg> for MessageRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Self::User,
            RoleArg::Assistant => Self::Assistant,
            RoleArg::System => Self::System,
        }
    }
}

/// Conversations are addressed by file name or by their 1-based position in
/// `history list`.
#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List conversations, most recently modified first
    List,
    /// Switch to an empty conversation, creating one if needed
    New,
    /// Print the turns of a conversation
    Show {
        conversation: String,
    },
    /// Append a turn as if the backend had reported it
    Append {
        conversation: String,
        /// Who said it
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
        /// What was said
        content: String,
    },
    /// Rename a conversation
    Rename {
        conversation: String,
        /// New title
        #[arg(required_unless_present = "generate", conflicts_with = "generate")]
        title: Option<String>,
        /// Derive the title from the first turns
        #[arg(long)]
        generate: bool,
    },
    /// Delete a conversation
    Delete {
        conversation: String,
    },
}
