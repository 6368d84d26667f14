//! JSON file configuration store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jarvis_core::config::Config;
use jarvis_core::ports::{ConfigStore, StoreError};
use tracing::{debug, info, warn};

use crate::io::write_atomic;
use crate::paths::ensure_directory;

/// Configuration store backed by a single `config.json`.
///
/// On first load the file is created, seeded from a bundled config when one
/// is provided and readable, otherwise from [`Config::default`].
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
    seed: Option<PathBuf>,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: None,
        }
    }

    /// Use `seed` as the initial config when no file exists yet.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<PathBuf>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn initial_config(&self) -> Config {
        let Some(seed) = &self.seed else {
            return Config::default();
        };
        match tokio::fs::read_to_string(seed).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!(seed = %seed.display(), "Seeding config from bundled file");
                    config
                }
                Err(e) => {
                    warn!(
                        seed = %seed.display(),
                        error = %e,
                        "Bundled config is invalid, using defaults"
                    );
                    Config::default()
                }
            },
            Err(e) => {
                debug!(seed = %seed.display(), error = %e, "No bundled config, using defaults");
                Config::default()
            }
        }
    }

    async fn write(&self, config: &Config) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            ensure_directory(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(config)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, contents.as_bytes())
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load(&self) -> Result<Config, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                StoreError::Serialization(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = self.initial_config().await;
                self.write(&config).await?;
                info!(path = %self.path.display(), "Created default config");
                Ok(config)
            }
            Err(e) => Err(StoreError::Io(format!("{}: {e}", self.path.display()))),
        }
    }

    async fn save(&self, config: &Config) -> Result<(), StoreError> {
        self.write(config).await?;
        debug!(path = %self.path.display(), "Saved config");
        Ok(())
    }
}
