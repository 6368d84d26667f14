//! Root CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Inspect and drive jarvis conversations from the terminal.
#[derive(Parser)]
#[command(name = "jarvis")]
#[command(about = "Manage jarvis conversations, settings and event logs")]
#[command(version)]
pub struct Cli {
    /// Data directory holding `history/` and `config.json`
    #[arg(long = "data-dir", env = "JARVIS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Bundled config copied into place when `config.json` does not exist yet
    #[arg(long = "config-seed", env = "JARVIS_CONFIG_SEED", global = true)]
    pub config_seed: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
