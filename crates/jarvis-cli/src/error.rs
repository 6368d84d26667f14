//! CLI error type and exit-code mapping.

use jarvis_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command-line input or input file.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Conversation or settings storage failed.
    #[error("Storage error: {0}")]
    Persistence(String),

    /// Missing credential or invalid setting.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Session(String),
}

impl CliError {
    /// Map the error to a process exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::NotFound(_) => 65,    // EX_DATAERR
            Self::Persistence(_) => 74, // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
            Self::Session(_) => 1,
        }
    }

    /// Exit code for an error returned by a handler.
    pub fn exit_code_of(err: &anyhow::Error) -> u8 {
        if let Some(cli) = err.downcast_ref::<Self>() {
            return cli.exit_code();
        }
        err.downcast_ref::<SessionError>()
            .map_or(1, |session| Self::from(session.clone()).exit_code())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(msg) => Self::Arguments(msg),
            SessionError::NotFound(id) => Self::NotFound(id.to_string()),
            SessionError::Persistence(e) => Self::Persistence(e.to_string()),
            SessionError::Configuration(msg) => Self::Config(msg),
            other => Self::Session(other.to_string()),
        }
    }
}
