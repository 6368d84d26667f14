//! Configuration store port definition.

use async_trait::async_trait;

use super::StoreError;
use crate::config::Config;

/// Repository for the user configuration.
///
/// Works with the domain [`Config`] directly; the implementation handles
/// serialization.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration.
    ///
    /// Returns (and persists) the default configuration if none is stored.
    async fn load(&self) -> Result<Config, StoreError>;

    /// Save the configuration.
    async fn save(&self, config: &Config) -> Result<(), StoreError>;
}
