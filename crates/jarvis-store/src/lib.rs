//! File-backed adapters for the jarvis conversation and config ports.
//!
//! - [`JsonConversationStore`]: one JSON file per conversation under `history/`
//! - [`JsonConfigStore`]: a single `config.json`
//! - [`paths`]: data root resolution (`JARVIS_DATA_DIR` or the system config dir)

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod conversations;
mod io;
pub mod naming;
pub mod paths;

pub use config::JsonConfigStore;
pub use conversations::JsonConversationStore;
pub use naming::{sanitize_title, validate_title};
pub use paths::{DATA_DIR_ENV, PathError, config_path, data_root, history_dir};
