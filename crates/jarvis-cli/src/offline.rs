//! Adapters used when no voice pipeline is attached.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use jarvis_core::domain::ConversationId;
use jarvis_core::events::SessionEvent;
use jarvis_core::ports::{BackendError, SessionEventEmitter, VoiceBackend};
use tracing::debug;

/// Words kept when deriving a title locally.
const TITLE_WORDS: usize = 6;

/// Backend stand-in for the terminal: no audio and no language model.
///
/// Titles are derived from the first words of the seed so automatic titling
/// still produces readable file names.
#[derive(Debug, Default)]
pub struct OfflineBackend {
    running: AtomicBool,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// First [`TITLE_WORDS`] words of the first non-blank line of `seed`.
pub fn local_title(seed: &str) -> Option<String> {
    let line = seed.lines().find(|line| !line.trim().is_empty())?;
    let words: Vec<&str> = line.split_whitespace().take(TITLE_WORDS).collect();
    let joined = words.join(" ");
    let mut chars = joined
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

#[async_trait]
impl VoiceBackend for OfflineBackend {
    async fn start_voice_session(&self) -> Result<(), BackendError> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_voice_session(&self) -> Result<(), BackendError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn session_status(&self) -> Result<bool, BackendError> {
        Ok(self.running.load(Ordering::SeqCst))
    }

    async fn send_text_prompt(&self, _prompt: &str) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(
            "no language model is attached to the terminal".to_string(),
        ))
    }

    async fn generate_title(&self, seed: &str) -> Result<String, BackendError> {
        local_title(seed).ok_or_else(|| BackendError::Rejected("seed has no words".to_string()))
    }

    async fn set_active_conversation(&self, id: &ConversationId) -> Result<(), BackendError> {
        debug!(conversation = %id, "Active conversation set");
        Ok(())
    }

    async fn list_input_devices(&self) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }

    async fn list_output_devices(&self) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }
}

/// Emitter that writes session events to the debug log.
#[derive(Debug, Clone, Default)]
pub struct TracingEmitter;

impl SessionEventEmitter for TracingEmitter {
    fn emit(&self, event: SessionEvent) {
        debug!(kind = event.kind(), ?event, "Session event");
    }

    fn clone_box(&self) -> Box<dyn SessionEventEmitter> {
        Box::new(self.clone())
    }
}
