//! Data directory resolution.
//!
//! Layout under the data root:
//!
//! ```text
//! <root>/
//!   config.json
//!   history/
//!     New Conversation - 2025-01-01_00-00-00.json
//! ```

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "JARVIS_DATA_DIR";

const APP_DIR_NAME: &str = "jarvis";
const HISTORY_DIR_NAME: &str = "history";
const CONFIG_FILE_NAME: &str = "config.json";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system config directory.
    #[error("Cannot determine system config directory")]
    NoConfigDir,

    /// A path was expected to be a directory but was not.
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}

/// Get the root directory for conversations and configuration.
///
/// Resolution order:
/// 1. `JARVIS_DATA_DIR` environment variable (highest priority)
/// 2. System config directory (e.g., `~/.config/jarvis`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let config_dir = dirs::config_dir().ok_or(PathError::NoConfigDir)?;
    Ok(config_dir.join(APP_DIR_NAME))
}

/// Directory holding one JSON file per conversation.
pub fn history_dir(root: &Path) -> PathBuf {
    root.join(HISTORY_DIR_NAME)
}

/// Path of the configuration file.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Create `path` (and parents) if missing.
pub async fn ensure_directory(path: &Path) -> Result<(), PathError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PathError::NotADirectory(path.to_path_buf())),
        Err(_) => tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| PathError::CreateFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
    }
}
