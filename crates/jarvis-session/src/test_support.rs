//! Mocks and in-memory fakes shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use jarvis_core::config::Config;
use jarvis_core::domain::{ConversationId, TitleResult, Turn, UNTITLED_TITLE};
use jarvis_core::ports::{BackendError, ConfigStore, ConversationStore, StoreError, VoiceBackend};
use mockall::mock;

mock! {
    pub Backend {}

    #[async_trait]
    impl VoiceBackend for Backend {
        async fn start_voice_session(&self) -> Result<(), BackendError>;
        async fn stop_voice_session(&self) -> Result<(), BackendError>;
        async fn session_status(&self) -> Result<bool, BackendError>;
        async fn send_text_prompt(&self, prompt: &str) -> Result<String, BackendError>;
        async fn generate_title(&self, seed: &str) -> Result<String, BackendError>;
        async fn set_active_conversation(&self, id: &ConversationId) -> Result<(), BackendError>;
        async fn list_input_devices(&self) -> Result<Vec<String>, BackendError>;
        async fn list_output_devices(&self) -> Result<Vec<String>, BackendError>;
    }
}

impl MockBackend {
    /// A backend that accepts conversation switches and nothing else.
    pub fn accepting_switches() -> Self {
        let mut backend = Self::new();
        backend
            .expect_set_active_conversation()
            .returning(|_| Ok(()));
        backend
    }
}

#[derive(Default)]
struct MemoryInner {
    /// `(id, turns, modification sequence)`
    conversations: Vec<(ConversationId, Vec<Turn>, u64)>,
    seq: u64,
}

/// Conversation store kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn turns(&self, id: &ConversationId) -> Option<Vec<Turn>> {
        let inner = self.inner.lock().unwrap();
        inner
            .conversations
            .iter()
            .find(|(c, _, _)| c == id)
            .map(|(_, turns, _)| turns.clone())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ConversationId>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .conversations
            .iter()
            .map(|(id, _, seq)| (*seq, id.clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }

    async fn create(&self) -> Result<ConversationId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.seq += 1;
        let seq = inner.seq;
        let id = ConversationId::compose(UNTITLED_TITLE, &format!("2025-01-01_00-00-{seq:02}"));
        inner.conversations.push((id.clone(), Vec::new(), seq));
        Ok(id)
    }

    async fn read(&self, id: &ConversationId) -> Result<Vec<Turn>, StoreError> {
        self.turns(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.seq += 1;
        let seq = inner.seq;
        let entry = inner
            .conversations
            .iter_mut()
            .find(|(c, _, _)| c == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        entry.1.push(turn);
        entry.2 = seq;
        Ok(())
    }

    async fn rename(&self, id: &ConversationId, title: &str) -> Result<TitleResult, StoreError> {
        if title.eq_ignore_ascii_case(UNTITLED_TITLE) {
            return Err(StoreError::InvalidTitle(title.to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .conversations
            .iter_mut()
            .find(|(c, _, _)| c == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let new_id = ConversationId::compose(title, id.timestamp_stem().unwrap_or("0"));
        entry.0 = new_id.clone();
        Ok(TitleResult {
            new_id,
            title: title.to_string(),
        })
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.conversations.retain(|(c, _, _)| c != id);
        Ok(())
    }
}

/// Config store kept in memory.
#[derive(Default)]
pub struct MemoryConfig {
    config: Mutex<Config>,
}

impl MemoryConfig {
    pub fn with(config: Config) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    pub fn stored(&self) -> Config {
        self.config.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfig {
    async fn load(&self) -> Result<Config, StoreError> {
        Ok(self.stored())
    }

    async fn save(&self, config: &Config) -> Result<(), StoreError> {
        *self.config.lock().unwrap() = config.clone();
        Ok(())
    }
}
