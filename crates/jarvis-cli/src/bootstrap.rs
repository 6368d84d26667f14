//! CLI bootstrap: the composition root.
//!
//! This is the only place where the JSON stores, the offline backend and the
//! session coordinator are wired together. Handlers receive the composed
//! [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use jarvis_core::domain::ConversationId;
use jarvis_core::ports::{Clock, SystemClock};
use jarvis_session::{
    EventChannel, EventPublisher, EventStream, ReconcileOutcome, SessionCoordinator, SessionDeps,
};
use jarvis_store::{JsonConfigStore, JsonConversationStore, config_path, data_root, history_dir};

use crate::error::CliError;
use crate::offline::{OfflineBackend, TracingEmitter};

/// Resolved locations for one invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_root: PathBuf,
    /// Seed for a missing `config.json`.
    pub config_seed: Option<PathBuf>,
}

impl CliConfig {
    /// Use `data_dir` if given, else the platform default.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_root = match data_dir {
            Some(dir) => dir,
            None => data_root()?,
        };
        Ok(Self {
            data_root,
            config_seed: None,
        })
    }

    #[must_use]
    pub fn with_config_seed(mut self, seed: Option<PathBuf>) -> Self {
        self.config_seed = seed;
        self
    }

    pub fn history_dir(&self) -> PathBuf {
        history_dir(&self.data_root)
    }

    pub fn config_path(&self) -> PathBuf {
        config_path(&self.data_root)
    }
}

/// Fully composed session for CLI commands.
pub struct CliContext {
    pub session: SessionCoordinator,
    pub events: EventStream,
    pub clock: Arc<dyn Clock>,
    pub paths: CliConfig,
}

impl CliContext {
    pub fn publisher(&self) -> EventPublisher {
        self.session.publisher()
    }

    /// Reconcile everything published so far.
    pub async fn drain(&mut self) -> Vec<ReconcileOutcome> {
        self.session.drain(&mut self.events).await
    }

    /// Resolve a conversation argument: a 1-based index into the history
    /// list, or a file name.
    pub fn resolve_conversation(&self, arg: &str) -> Result<ConversationId, CliError> {
        let history = self.session.history();
        if let Ok(index) = arg.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| history.get(i))
                .cloned()
                .ok_or_else(|| {
                    CliError::NotFound(format!(
                        "no conversation #{index} ({} in history)",
                        history.len()
                    ))
                });
        }
        let id = ConversationId::new(arg);
        if history.contains(&id) {
            Ok(id)
        } else {
            Err(CliError::NotFound(arg.to_string()))
        }
    }
}

/// Compose the stores, the offline backend and an initialized coordinator.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let conversations =
        JsonConversationStore::open(config.history_dir(), Arc::clone(&clock)).await?;
    let mut config_store = JsonConfigStore::new(config.config_path());
    if let Some(seed) = &config.config_seed {
        config_store = config_store.with_seed(seed);
    }

    let (channel, events) = EventChannel::new();
    let deps = SessionDeps {
        conversations: Arc::new(conversations),
        config: Arc::new(config_store),
        backend: Arc::new(OfflineBackend::new()),
        emitter: Arc::new(TracingEmitter),
        clock: Arc::clone(&clock),
    };
    let mut session = SessionCoordinator::new(deps, channel);
    session.initialize().await?;

    Ok(CliContext {
        session,
        events,
        clock,
        paths: config,
    })
}
