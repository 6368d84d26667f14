//! Top-level commands.

use std::path::PathBuf;

use clap::Subcommand;

use crate::config_commands::ConfigCommand;
use crate::history_commands::HistoryCommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Show resolved paths for the data directory
    Paths,

    /// List, inspect and edit conversations
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// View or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Feed a JSONL log of backend notifications through a session
    Replay {
        /// File with one `{"event": ..., "payload": ...}` object per line
        file: PathBuf,
        /// Print the outcome of every line
        #[arg(long)]
        trace: bool,
    },
}
