//! Command-line adapter for the jarvis voice assistant.
//!
//! The binary is the composition root: it wires the JSON stores, an offline
//! voice backend and a [`SessionCoordinator`](jarvis_session::SessionCoordinator)
//! together, then dispatches to a handler per command.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs
use tracing_subscriber as _;

#[cfg(test)]
use tokio_test as _;

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod history_commands;
pub mod offline;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use config_commands::{ConfigCommand, KeyName};
pub use error::CliError;
pub use history_commands::{HistoryCommand, RoleArg};
pub use offline::{OfflineBackend, TracingEmitter};
pub use parser::Cli;
