//! Shared fixtures: a scriptable backend and a coordinator over a temp dir.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jarvis_core::config::Config;
use jarvis_core::domain::ConversationId;
use jarvis_core::events::SessionEvent;
use jarvis_core::ports::{BackendError, ChannelEmitter, FixedClock, VoiceBackend};
use jarvis_session::{EventChannel, EventStream, SessionCoordinator, SessionDeps};
use jarvis_store::{JsonConfigStore, JsonConversationStore};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Default)]
struct FakeState {
    running: bool,
    fail_start: bool,
    title: Option<String>,
    active: Option<ConversationId>,
    prompts: Vec<String>,
    seeds: Vec<String>,
}

/// Backend double whose answers are set by the test.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn titling(title: &str) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().title = Some(title.to_string());
        backend
    }

    pub fn fail_start(&self) {
        self.state.lock().unwrap().fail_start = true;
    }

    /// Simulate the voice loop exiting on its own.
    pub fn crash(&self) {
        self.state.lock().unwrap().running = false;
    }

    pub fn active(&self) -> Option<ConversationId> {
        self.state.lock().unwrap().active.clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    pub fn seeds(&self) -> Vec<String> {
        self.state.lock().unwrap().seeds.clone()
    }
}

#[async_trait]
impl VoiceBackend for FakeBackend {
    async fn start_voice_session(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(BackendError::Unavailable("microphone busy".into()));
        }
        state.running = true;
        Ok(())
    }

    async fn stop_voice_session(&self) -> Result<(), BackendError> {
        self.state.lock().unwrap().running = false;
        Ok(())
    }

    async fn session_status(&self) -> Result<bool, BackendError> {
        Ok(self.state.lock().unwrap().running)
    }

    async fn send_text_prompt(&self, prompt: &str) -> Result<String, BackendError> {
        self.state.lock().unwrap().prompts.push(prompt.to_string());
        Ok("accepted".to_string())
    }

    async fn generate_title(&self, seed: &str) -> Result<String, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.seeds.push(seed.to_string());
        state
            .title
            .clone()
            .ok_or_else(|| BackendError::Unavailable("no title model".into()))
    }

    async fn set_active_conversation(&self, id: &ConversationId) -> Result<(), BackendError> {
        self.state.lock().unwrap().active = Some(id.clone());
        Ok(())
    }

    async fn list_input_devices(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec!["Built-in Microphone".to_string()])
    }

    async fn list_output_devices(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec!["Built-in Speakers".to_string()])
    }
}

pub fn keyed_config() -> Config {
    Config {
        gemini_key: "gemini".to_string(),
        porcupine_key: "porcupine".to_string(),
        ..Config::default()
    }
}

pub struct Fixture {
    pub temp: TempDir,
    pub backend: Arc<FakeBackend>,
    pub conversations: Arc<JsonConversationStore>,
    pub emitted: UnboundedReceiver<SessionEvent>,
}

impl Fixture {
    pub fn drain_emitted(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.emitted.try_recv().ok()).collect()
    }
}

/// Build an uninitialized coordinator over a fresh temp dir at a fixed time
/// of 2025-01-01 00:00:00 UTC.
pub async fn coordinator(
    backend: FakeBackend,
    config: Config,
) -> (SessionCoordinator, EventStream, Fixture) {
    let temp = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    ));
    let conversations = Arc::new(
        JsonConversationStore::open(temp.path().join("history"), clock.clone())
            .await
            .unwrap(),
    );
    let config_store = JsonConfigStore::new(temp.path().join("config.json"));
    {
        use jarvis_core::ports::ConfigStore as _;
        config_store.save(&config).await.unwrap();
    }

    let backend = Arc::new(backend);
    let (emitter, emitted) = ChannelEmitter::new();
    let (channel, events) = EventChannel::new();
    let deps = SessionDeps {
        conversations: conversations.clone(),
        config: Arc::new(config_store),
        backend: backend.clone(),
        emitter: Arc::new(emitter),
        clock,
    };

    let fixture = Fixture {
        temp,
        backend,
        conversations,
        emitted,
    };
    (SessionCoordinator::new(deps, channel), events, fixture)
}
