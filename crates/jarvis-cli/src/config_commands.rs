//! Settings subcommands.

use clap::{Subcommand, ValueEnum};
use jarvis_core::config::Config;

/// Credential fields settable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyName {
    Porcupine,
    Gemini,
    Elevenlabs,
}

impl KeyName {
    /// The config field holding this key.
    pub const fn slot(self, config: &mut Config) -> &mut String {
        match self {
            Self::Porcupine => &mut config.porcupine_key,
            Self::Gemini => &mut config.gemini_key,
            Self::Elevenlabs => &mut config.elevenlabs_key,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the current settings with keys redacted
    Show,
    /// Print the config file location
    Path,
    /// Check the stored settings against the validation rules
    Validate,
    /// Store an API key
    SetKey {
        #[arg(value_enum)]
        name: KeyName,
        value: String,
    },
}
