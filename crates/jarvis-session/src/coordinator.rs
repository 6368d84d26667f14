//! Session coordinator: the single owner of session state.
//!
//! The coordinator ties the conversation store, the config store, the voice
//! state machine and the backend notification channel together. It owns the
//! active conversation pointer and the message projection; presentation only
//! sees [`SessionSnapshot`]s and [`SessionEvent`]s.
//!
//! Every method takes `&mut self`, so callers process one reaction at a time.
//! [`SessionRunner`](crate::SessionRunner) does exactly that inside one task.

use std::collections::VecDeque;
use std::sync::Arc;

use jarvis_core::config::{Config, validate_config};
use jarvis_core::domain::{ConversationId, Message, MessageRole, TitleResult, Turn, VoiceState};
use jarvis_core::events::{BackendEvent, MessageMetaPayload, SessionEvent};
use jarvis_core::ports::{
    Clock, ConfigStore, ConversationStore, SessionEventEmitter, StoreError, VoiceBackend,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::channel::{EventChannel, EventPublisher, Envelope, Generation, Subscription};
use crate::error::SessionError;
use crate::reconcile::{DownloadTracker, MessageProjection, MissReason, ReconcileOutcome};
use crate::titling::title_seed;
use crate::voice_state::{Transition, VoiceStateMachine};

/// Notice shown when a prompt is sent without an LLM key.
pub const GEMINI_KEY_NOTICE: &str = "Please enter your Gemini API key in Settings > API Keys.";

/// Notice shown when voice is started without a wake-word key.
pub const PORCUPINE_KEY_NOTICE: &str =
    "Please enter your Porcupine access key in Settings > API Keys.";

/// How many superseded subscriptions are remembered for late messages.
const RETIRED_SUBSCRIPTIONS: usize = 8;

/// Collaborators of a [`SessionCoordinator`].
#[derive(Clone)]
pub struct SessionDeps {
    pub conversations: Arc<dyn ConversationStore>,
    pub config: Arc<dyn ConfigStore>,
    pub backend: Arc<dyn VoiceBackend>,
    pub emitter: Arc<dyn SessionEventEmitter>,
    pub clock: Arc<dyn Clock>,
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub voice_state: VoiceState,
    pub active_conversation: Option<ConversationId>,
    pub messages: Vec<Message>,
    pub history: Vec<ConversationId>,
    pub download_percent: Option<u8>,
}

/// Owner of the active conversation, the projection and the voice state.
pub struct SessionCoordinator {
    conversations: Arc<dyn ConversationStore>,
    config_store: Arc<dyn ConfigStore>,
    backend: Arc<dyn VoiceBackend>,
    emitter: Arc<dyn SessionEventEmitter>,
    clock: Arc<dyn Clock>,

    channel: EventChannel,
    voice: VoiceStateMachine,
    config: Config,

    subscription: Option<Subscription>,
    /// Superseded subscriptions and the conversation each was bound to.
    retired: VecDeque<(Generation, ConversationId)>,
    projection: MessageProjection,
    history: Vec<ConversationId>,
    downloads: DownloadTracker,
}

impl SessionCoordinator {
    pub fn new(deps: SessionDeps, channel: EventChannel) -> Self {
        Self {
            voice: VoiceStateMachine::new(Arc::clone(&deps.backend)),
            conversations: deps.conversations,
            config_store: deps.config,
            backend: deps.backend,
            emitter: deps.emitter,
            clock: deps.clock,
            channel,
            config: Config::default(),
            subscription: None,
            retired: VecDeque::with_capacity(RETIRED_SUBSCRIPTIONS),
            projection: MessageProjection::default(),
            history: Vec::new(),
            downloads: DownloadTracker::default(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// A publishing handle for the backend adapter.
    pub fn publisher(&self) -> EventPublisher {
        self.channel.publisher()
    }

    pub const fn voice_state(&self) -> VoiceState {
        self.voice.state()
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.subscription.as_ref().map(Subscription::conversation)
    }

    pub fn messages(&self) -> &[Message] {
        self.projection.messages()
    }

    pub fn history(&self) -> &[ConversationId] {
        &self.history
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            voice_state: self.voice.state(),
            active_conversation: self.active_conversation().cloned(),
            messages: self.projection.messages().to_vec(),
            history: self.history.clone(),
            download_percent: self.downloads.percent(),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Load config, make sure a conversation exists and select the newest.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        self.load_config().await?;
        let history = self.ensure_history().await?;
        if let Some(newest) = history.first().cloned() {
            self.activate(newest).await?;
        }
        info!(
            conversations = history.len(),
            active = ?self.active_conversation(),
            "Session initialized"
        );
        Ok(())
    }

    /// Create a conversation if the store is empty; return the history.
    pub async fn ensure_history(&mut self) -> Result<Vec<ConversationId>, SessionError> {
        let mut ids = self.conversations.list().await?;
        if ids.is_empty() {
            let id = self.conversations.create().await?;
            info!(conversation = %id, "Created first conversation");
            ids = self.conversations.list().await?;
        }
        self.set_history(ids.clone());
        Ok(ids)
    }

    // ── Conversations ──────────────────────────────────────────────

    /// Make `id` the active conversation.
    pub async fn select_conversation(&mut self, id: &ConversationId) -> Result<(), SessionError> {
        if self.active_conversation() == Some(id) {
            return Ok(());
        }
        let ids = self.conversations.list().await?;
        if !ids.contains(id) {
            return Err(SessionError::NotFound(id.clone()));
        }
        self.activate(id.clone()).await
    }

    /// Switch to an empty conversation, creating one only if none exists.
    pub async fn new_conversation(&mut self) -> Result<ConversationId, SessionError> {
        if let Some(active) = self.active_conversation().cloned() {
            if self.projection.is_empty() && self.is_empty_conversation(&active).await {
                return Ok(active);
            }
        }

        let ids = self.conversations.list().await?;
        for id in ids.iter().filter(|id| id.is_untitled()) {
            if self.is_empty_conversation(id).await {
                debug!(conversation = %id, "Reusing empty conversation");
                self.activate(id.clone()).await?;
                return Ok(id.clone());
            }
        }

        let id = self.conversations.create().await?;
        self.refresh_history().await?;
        self.activate(id.clone()).await?;
        Ok(id)
    }

    /// Rename a conversation, following it if it is active.
    pub async fn rename_conversation(
        &mut self,
        id: &ConversationId,
        title: &str,
    ) -> Result<TitleResult, SessionError> {
        let result = self.conversations.rename(id, title).await?;
        if result.new_id != *id {
            self.repoint(id, &result.new_id).await;
        }
        self.refresh_history().await?;
        Ok(result)
    }

    /// Delete a conversation. Deleting the active one first selects the
    /// newest remaining conversation, creating one if it was the last.
    ///
    /// If the replacement cannot be activated nothing is deleted.
    pub async fn delete_conversation(&mut self, id: &ConversationId) -> Result<(), SessionError> {
        if self.active_conversation() == Some(id) {
            let replacement = self.replacement_for(id).await?;
            self.activate(replacement).await?;
        }

        let deleted = self.conversations.delete(id).await;
        self.refresh_history().await?;
        deleted?;
        self.retired.retain(|(_, conversation)| conversation != id);
        info!(conversation = %id, "Deleted conversation");
        Ok(())
    }

    /// Ask the backend for a title and rename the conversation to it.
    pub async fn generate_and_rename_conversation(
        &mut self,
        id: &ConversationId,
    ) -> Result<TitleResult, SessionError> {
        let turns = self.conversations.read(id).await?;
        let seed = title_seed(&turns);
        let title = self.backend.generate_title(&seed).await?;
        debug!(conversation = %id, title = %title, "Generated title");
        self.rename_conversation(id, &title).await
    }

    // ── Prompts and notices ────────────────────────────────────────

    /// Send a typed prompt. Resulting turns arrive as notifications.
    pub async fn send_text(&mut self, prompt: &str) -> Result<String, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::Validation("prompt is empty".to_string()));
        }
        if !self.config.has_llm_credential() {
            self.append_system_notice(GEMINI_KEY_NOTICE).await;
            return Err(SessionError::Configuration(
                "gemini_key is not set".to_string(),
            ));
        }
        let ack = self.backend.send_text_prompt(prompt).await?;
        Ok(ack)
    }

    /// Show a system message, persisting it to the active conversation.
    pub async fn append_system_notice(&mut self, text: &str) {
        let message = Message::from(Turn::new(
            MessageRole::System,
            text,
            self.clock.now_millis(),
        ));

        let mut target = self.active_conversation().cloned();
        if let Some(active) = target.clone() {
            let gone = self
                .persist(&active, &message)
                .await
                .is_err_and(|e| e.is_not_found());
            if gone {
                target = self.recover_active(&active).await;
                if let Some(next) = &target {
                    let _ = self.persist(next, &message).await;
                }
            }
        }

        self.projection.push(message.clone());
        if let Some(conversation_id) = target {
            self.emitter.emit(SessionEvent::MessageAppended {
                conversation_id,
                message,
            });
        }
        self.emitter.emit(SessionEvent::notice(text));
    }

    // ── Voice ──────────────────────────────────────────────────────

    pub async fn start_voice_session(&mut self) -> Result<(), SessionError> {
        if !self.config.has_wake_word_credential() {
            self.append_system_notice(PORCUPINE_KEY_NOTICE).await;
            return Err(SessionError::Configuration(
                "porcupine_key is not set".to_string(),
            ));
        }
        let transition = self.voice.request_start().await?;
        self.emit_transition(transition);
        Ok(())
    }

    pub async fn stop_voice_session(&mut self) -> Result<(), SessionError> {
        let transition = self.voice.request_stop().await?;
        self.emit_transition(transition);
        Ok(())
    }

    /// One liveness probe; forces idle if the backend stopped on its own.
    pub async fn poll_liveness(&mut self) -> Option<Transition> {
        let transition = self.voice.poll_liveness().await;
        self.emit_transition(transition);
        transition
    }

    // ── Configuration and devices ──────────────────────────────────

    pub async fn load_config(&mut self) -> Result<Config, SessionError> {
        let config = self.config_store.load().await?;
        self.config = config.clone();
        Ok(config)
    }

    /// Validate and persist `config`, then adopt it.
    pub async fn save_config(&mut self, config: Config) -> Result<(), SessionError> {
        validate_config(&config).map_err(|e| SessionError::Validation(e.to_string()))?;
        self.config_store.save(&config).await?;
        self.config = config;
        info!("Configuration saved");
        Ok(())
    }

    pub async fn list_input_devices(&self) -> Vec<String> {
        self.backend.list_input_devices().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list input devices");
            Vec::new()
        })
    }

    pub async fn list_output_devices(&self) -> Vec<String> {
        self.backend.list_output_devices().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list output devices");
            Vec::new()
        })
    }

    // ── Notifications ──────────────────────────────────────────────

    /// Drain every queued notification from `events`.
    pub async fn drain(&mut self, events: &mut crate::EventStream) -> Vec<ReconcileOutcome> {
        let mut outcomes = Vec::new();
        while let Some(envelope) = events.try_recv() {
            outcomes.push(self.handle_envelope(envelope).await);
        }
        outcomes
    }

    /// Reconcile one backend notification.
    pub async fn handle_envelope(&mut self, envelope: Envelope) -> ReconcileOutcome {
        let current = self
            .subscription
            .as_ref()
            .is_some_and(|subscription| subscription.covers(&envelope));
        let generation = envelope.generation;

        let outcome = match envelope.event {
            BackendEvent::StateChanged { label } => self.on_state_label(&label),
            BackendEvent::NewMessage(payload) => match payload.into_message() {
                Err(label) => ReconcileOutcome::Dropped(MissReason::UnknownRole(label)),
                Ok(message) if current => self.on_current_message(message).await,
                Ok(message) => self.on_stale_message(generation, message).await,
            },
            BackendEvent::MessageMeta(payload) if current => self.on_meta(payload),
            BackendEvent::MessageMeta(_) => ReconcileOutcome::Dropped(MissReason::StaleMeta),
            BackendEvent::DownloadProgress(tick) => {
                let outcome = self.downloads.on_progress(&tick);
                if let Some(percent) = self.downloads.percent().filter(|_| outcome.is_applied()) {
                    self.emitter.emit(SessionEvent::DownloadProgress { percent });
                }
                outcome
            }
            BackendEvent::DownloadComplete => {
                let outcome = self.downloads.on_complete();
                if outcome.is_applied() {
                    info!("Model download complete");
                    self.emitter.emit(SessionEvent::DownloadComplete);
                }
                outcome
            }
        };

        if let ReconcileOutcome::Dropped(reason) = &outcome {
            debug!(generation, ?reason, "Notification dropped");
        }
        outcome
    }

    fn on_state_label(&mut self, label: &str) -> ReconcileOutcome {
        match self.voice.apply_backend_label(label) {
            Ok(transition) => {
                self.emit_transition(transition);
                ReconcileOutcome::Applied
            }
            Err(raw) => ReconcileOutcome::Dropped(MissReason::UnknownState(raw)),
        }
    }

    async fn on_current_message(&mut self, message: Message) -> ReconcileOutcome {
        let Some(active) = self.active_conversation().cloned() else {
            return ReconcileOutcome::Dropped(MissReason::NoActiveConversation);
        };

        if let Err(e) = self.persist(&active, &message).await {
            if e.is_not_found() {
                self.recover_active(&active).await;
                return ReconcileOutcome::Dropped(MissReason::ActiveConversationGone);
            }
        }
        let from_user = message.role == MessageRole::User;
        self.projection.push(message.clone());
        self.emitter.emit(SessionEvent::MessageAppended {
            conversation_id: active.clone(),
            message,
        });

        if from_user && active.is_untitled() {
            if let Err(e) = self.generate_and_rename_conversation(&active).await {
                warn!(conversation = %active, error = %e, "Automatic titling failed");
            }
        }
        ReconcileOutcome::Applied
    }

    /// Persist a message published before a switch to the conversation it
    /// was addressed to.
    async fn on_stale_message(
        &mut self,
        generation: Generation,
        message: Message,
    ) -> ReconcileOutcome {
        let Some(target) = self
            .retired
            .iter()
            .find(|(retired, _)| *retired == generation)
            .map(|(_, conversation)| conversation.clone())
        else {
            return ReconcileOutcome::Dropped(MissReason::StaleTargetGone);
        };

        match self.conversations.append(&target, message.to_turn()).await {
            Ok(()) if self.active_conversation() == Some(&target) => {
                // Switched away and back: the message belongs here after all.
                self.projection.push(message.clone());
                self.emitter.emit(SessionEvent::MessageAppended {
                    conversation_id: target,
                    message,
                });
                ReconcileOutcome::Applied
            }
            Ok(()) => {
                debug!(conversation = %target, "Persisted late message to previous conversation");
                ReconcileOutcome::PersistedOnly
            }
            Err(e) => {
                if !e.is_not_found() {
                    warn!(conversation = %target, error = %e, "Failed to persist late message");
                }
                ReconcileOutcome::Dropped(MissReason::StaleTargetGone)
            }
        }
    }

    fn on_meta(&mut self, payload: MessageMetaPayload) -> ReconcileOutcome {
        let outcome = self
            .projection
            .merge_meta(payload.created_at_of_assistant, payload.meta);
        if outcome.is_applied() {
            if let Some(active) = self.active_conversation().cloned() {
                self.emitter.emit(SessionEvent::MessageMetaMerged {
                    conversation_id: active,
                    created_at: payload.created_at_of_assistant,
                    meta: payload.meta,
                });
            }
        }
        outcome
    }

    // ── Internal helpers ───────────────────────────────────────────

    /// Inform the backend, load the turns and swap the subscription.
    async fn activate(&mut self, id: ConversationId) -> Result<(), SessionError> {
        self.backend.set_active_conversation(&id).await?;

        let turns = match self.conversations.read(&id).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(conversation = %id, error = %e, "Failed to read conversation");
                Vec::new()
            }
        };

        let subscription = self.channel.subscribe(id.clone());
        if let Some(previous) = self.subscription.replace(subscription) {
            self.retire(previous);
        }
        self.projection = MessageProjection::from_turns(turns);

        info!(conversation = %id, messages = self.projection.len(), "Active conversation changed");
        self.emitter
            .emit(SessionEvent::ActiveConversationChanged { conversation_id: id });
        Ok(())
    }

    fn retire(&mut self, subscription: Subscription) {
        if self.retired.len() == RETIRED_SUBSCRIPTIONS {
            self.retired.pop_front();
        }
        self.retired
            .push_back((subscription.generation(), subscription.conversation().clone()));
    }

    /// Follow a rename: retired bindings and the active pointer move to `new`.
    async fn repoint(&mut self, old: &ConversationId, new: &ConversationId) {
        for (_, conversation) in &mut self.retired {
            if conversation == old {
                *conversation = new.clone();
            }
        }

        let Some(subscription) = self.subscription.as_mut() else {
            return;
        };
        if subscription.conversation() != old {
            return;
        }
        subscription.retarget(new.clone());

        if let Err(e) = self.backend.set_active_conversation(new).await {
            warn!(conversation = %new, error = %e, "Failed to re-point backend after rename");
        }
        self.emitter.emit(SessionEvent::ActiveConversationChanged {
            conversation_id: new.clone(),
        });
    }

    async fn refresh_history(&mut self) -> Result<(), SessionError> {
        let ids = self.conversations.list().await?;
        self.set_history(ids);
        Ok(())
    }

    fn set_history(&mut self, ids: Vec<ConversationId>) {
        self.history = ids;
        self.emitter.emit(SessionEvent::HistoryChanged {
            conversations: self.history.clone(),
        });
    }

    async fn is_empty_conversation(&self, id: &ConversationId) -> bool {
        self.conversations
            .read(id)
            .await
            .is_ok_and(|turns| turns.is_empty())
    }

    /// Append to the store, reporting any failure as an error event.
    async fn persist(&self, id: &ConversationId, message: &Message) -> Result<(), StoreError> {
        let result = self.conversations.append(id, message.to_turn()).await;
        if let Err(e) = &result {
            warn!(conversation = %id, error = %e, "Failed to persist message");
            self.emitter
                .emit(SessionEvent::error(format!("Failed to save message: {e}")));
        }
        result
    }

    /// The newest conversation other than `id`, created if `id` is the last.
    async fn replacement_for(
        &mut self,
        id: &ConversationId,
    ) -> Result<ConversationId, SessionError> {
        let ids = self.conversations.list().await?;
        if let Some(next) = ids.into_iter().find(|other| other != id) {
            return Ok(next);
        }
        let created = self.conversations.create().await?;
        info!(conversation = %created, "Created conversation to replace the last one");
        Ok(created)
    }

    /// The active conversation vanished from the store: select the newest
    /// remaining one, creating one if the store is now empty.
    ///
    /// Returns the conversation that became active. On failure the pointer
    /// stays where it was.
    async fn recover_active(&mut self, gone: &ConversationId) -> Option<ConversationId> {
        warn!(conversation = %gone, "Active conversation no longer exists");
        let next = match self.ensure_history().await {
            Ok(ids) => ids.into_iter().next()?,
            Err(e) => {
                warn!(error = %e, "Failed to restore a conversation");
                return None;
            }
        };
        match self.activate(next.clone()).await {
            Ok(()) => Some(next),
            Err(e) => {
                warn!(
                    conversation = %next,
                    error = %e,
                    "Failed to activate replacement conversation"
                );
                None
            }
        }
    }

    fn emit_transition(&self, transition: Option<Transition>) {
        if let Some(Transition { from, to, cause }) = transition {
            self.emitter
                .emit(SessionEvent::VoiceStateChanged { from, to, cause });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::EventStream;
    use crate::test_support::{MemoryConfig, MemoryStore, MockBackend};
    use chrono::{TimeZone, Utc};
    use jarvis_core::domain::MessageMeta;
    use jarvis_core::events::{DownloadProgressPayload, NewMessagePayload};
    use jarvis_core::ports::{BackendError, ChannelEmitter, FixedClock};
    use mockall::predicate::eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_test::{assert_err, assert_ok};

    struct Harness {
        coordinator: SessionCoordinator,
        store: Arc<MemoryStore>,
        config: Arc<MemoryConfig>,
        events: EventStream,
        publisher: EventPublisher,
        emitted: UnboundedReceiver<SessionEvent>,
    }

    impl Harness {
        async fn drain(&mut self) -> Vec<ReconcileOutcome> {
            self.coordinator.drain(&mut self.events).await
        }

        fn emitted(&mut self) -> Vec<SessionEvent> {
            std::iter::from_fn(|| self.emitted.try_recv().ok()).collect()
        }

        fn active(&self) -> ConversationId {
            self.coordinator.active_conversation().cloned().unwrap()
        }
    }

    async fn harness(backend: MockBackend, config: Config) -> Harness {
        let store = Arc::new(MemoryStore::default());
        let config = Arc::new(MemoryConfig::with(config));
        let (emitter, emitted) = ChannelEmitter::new();
        let (channel, events) = EventChannel::new();
        let deps = SessionDeps {
            conversations: store.clone(),
            config: config.clone(),
            backend: Arc::new(backend),
            emitter: Arc::new(emitter),
            clock: Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            )),
        };
        let mut coordinator = SessionCoordinator::new(deps, channel);
        coordinator.initialize().await.unwrap();
        let publisher = coordinator.publisher();
        Harness {
            coordinator,
            store,
            config,
            events,
            publisher,
            emitted,
        }
    }

    fn keyed_config() -> Config {
        Config {
            gemini_key: "gemini".to_string(),
            porcupine_key: "porcupine".to_string(),
            ..Config::default()
        }
    }

    fn message(role: &str, content: &str, created_at: i64) -> BackendEvent {
        BackendEvent::NewMessage(NewMessagePayload {
            id: None,
            role: role.to_string(),
            content: content.to_string(),
            created_at,
            meta: None,
        })
    }

    fn latency(created_at: i64, ms: u64) -> BackendEvent {
        BackendEvent::MessageMeta(MessageMetaPayload {
            created_at_of_assistant: created_at,
            meta: MessageMeta {
                latency_ms: Some(ms),
                ..MessageMeta::default()
            },
        })
    }

    #[tokio::test]
    async fn initialize_creates_and_selects_first_conversation() {
        let mut h = harness(MockBackend::accepting_switches(), Config::default()).await;

        assert_eq!(h.coordinator.history().len(), 1);
        assert!(h.active().is_untitled());
        assert!(h.emitted().iter().any(|e| matches!(
            e,
            SessionEvent::ActiveConversationChanged { .. }
        )));
    }

    #[tokio::test]
    async fn assistant_message_is_persisted_and_meta_merged() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        h.publisher.publish(message("assistant", "Sunny.", 500));
        h.publisher.publish(latency(500, 1200));

        let outcomes = h.drain().await;

        assert_eq!(outcomes, [ReconcileOutcome::Applied, ReconcileOutcome::Applied]);
        let messages = h.coordinator.messages();
        assert_eq!(messages[0].meta.unwrap().latency_ms, Some(1200));
        assert_eq!(h.store.turns(&h.active()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_role_is_dropped() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        h.publisher.publish(message("narrator", "Once upon a time", 1));

        let outcomes = h.drain().await;

        assert_eq!(
            outcomes,
            [ReconcileOutcome::Dropped(MissReason::UnknownRole(
                "narrator".to_string()
            ))]
        );
        assert!(h.coordinator.messages().is_empty());
    }

    #[tokio::test]
    async fn stale_meta_is_dropped_after_switch() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        h.publisher.publish(message("assistant", "Hi", 7));
        h.drain().await;

        h.publisher.publish(latency(7, 10));
        h.coordinator.new_conversation().await.unwrap();

        assert_eq!(
            h.drain().await,
            [ReconcileOutcome::Dropped(MissReason::StaleMeta)]
        );
    }

    #[tokio::test]
    async fn late_message_goes_to_its_own_conversation() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        let first = h.active();
        h.publisher.publish(message("assistant", "earlier", 1));
        h.drain().await;

        h.publisher.publish(message("assistant", "late", 2));
        let second = h.coordinator.new_conversation().await.unwrap();
        assert_ne!(first, second);

        assert_eq!(h.drain().await, [ReconcileOutcome::PersistedOnly]);
        assert!(h.coordinator.messages().is_empty());
        let contents: Vec<_> = h
            .store
            .turns(&first)
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, ["earlier", "late"]);
    }

    #[tokio::test]
    async fn user_turn_in_untitled_conversation_triggers_titling() {
        let mut backend = MockBackend::accepting_switches();
        backend
            .expect_generate_title()
            .with(eq("hello\n"))
            .times(1)
            .returning(|_| Ok("Greeting".to_string()));
        let mut h = harness(backend, keyed_config()).await;
        let untitled = h.active();

        h.publisher.publish(message("user", "hello", 1));
        h.drain().await;

        let active = h.active();
        assert_eq!(active.title(), "Greeting");
        assert_eq!(active.timestamp_stem(), untitled.timestamp_stem());
        assert_eq!(h.coordinator.messages().len(), 1);

        // Titled now: the next user turn does not ask again.
        h.publisher.publish(message("user", "again", 2));
        h.drain().await;
        assert_eq!(h.store.turns(&active).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_titling_keeps_conversation_and_retries() {
        let mut backend = MockBackend::accepting_switches();
        backend
            .expect_generate_title()
            .times(2)
            .returning(|_| Err(BackendError::Unavailable("offline".into())));
        let mut h = harness(backend, keyed_config()).await;

        h.publisher.publish(message("user", "one", 1));
        h.publisher.publish(message("user", "two", 2));
        let outcomes = h.drain().await;

        assert!(outcomes.iter().all(ReconcileOutcome::is_applied));
        assert!(h.active().is_untitled());
        assert_eq!(h.store.turns(&h.active()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn send_text_without_key_posts_notice() {
        let mut h = harness(MockBackend::accepting_switches(), Config::default()).await;

        let err = assert_err!(h.coordinator.send_text("hi").await);

        assert!(matches!(err, SessionError::Configuration(_)));
        let messages = h.coordinator.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, GEMINI_KEY_NOTICE);
        assert_eq!(h.store.turns(&h.active()).unwrap().len(), 1);
        assert!(h.emitted().contains(&SessionEvent::notice(GEMINI_KEY_NOTICE)));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_backend() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        let err = assert_err!(h.coordinator.send_text("  \n ").await);
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn send_text_forwards_prompt() {
        let mut backend = MockBackend::accepting_switches();
        backend
            .expect_send_text_prompt()
            .with(eq("what time is it"))
            .returning(|_| Ok("ok".to_string()));
        let mut h = harness(backend, keyed_config()).await;

        assert_eq!(
            assert_ok!(h.coordinator.send_text("what time is it").await),
            "ok"
        );
    }

    #[tokio::test]
    async fn start_requires_wake_word_key() {
        let mut backend = MockBackend::accepting_switches();
        backend.expect_start_voice_session().never();
        let mut h = harness(backend, Config::default()).await;

        let err = assert_err!(h.coordinator.start_voice_session().await);

        assert!(matches!(err, SessionError::Configuration(_)));
        assert_eq!(h.coordinator.voice_state(), VoiceState::Idle);
        assert_eq!(h.coordinator.messages()[0].content, PORCUPINE_KEY_NOTICE);
    }

    #[tokio::test]
    async fn backend_idle_after_start_returns_to_idle() {
        let mut backend = MockBackend::accepting_switches();
        backend.expect_start_voice_session().returning(|| Ok(()));
        let mut h = harness(backend, keyed_config()).await;

        assert_ok!(h.coordinator.start_voice_session().await);
        h.publisher.publish(BackendEvent::state_changed("Recording"));
        h.publisher.publish(BackendEvent::state_changed("Idle"));
        h.drain().await;

        assert_eq!(h.coordinator.voice_state(), VoiceState::Idle);
        let changes: Vec<_> = h
            .emitted()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::VoiceStateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect();
        assert_eq!(
            changes,
            [VoiceState::WakeListening, VoiceState::Recording, VoiceState::Idle]
        );
    }

    #[tokio::test]
    async fn invalid_config_is_not_saved() {
        let mut h = harness(MockBackend::accepting_switches(), Config::default()).await;
        let bad = Config {
            frame_duration_ms: 15,
            ..Config::default()
        };

        let err = assert_err!(h.coordinator.save_config(bad).await);

        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(h.config.stored(), Config::default());
        assert_eq!(h.coordinator.config(), &Config::default());
    }

    #[tokio::test]
    async fn saved_config_is_adopted() {
        let mut h = harness(MockBackend::accepting_switches(), Config::default()).await;

        assert_ok!(h.coordinator.save_config(keyed_config()).await);

        assert_eq!(h.config.stored(), keyed_config());
        assert!(h.coordinator.config().has_llm_credential());
    }

    #[tokio::test]
    async fn failed_switch_leaves_active_conversation() {
        let mut backend = MockBackend::new();
        let mut calls = 0;
        backend.expect_set_active_conversation().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(BackendError::Unavailable("offline".into()))
            }
        });
        let mut h = harness(backend, keyed_config()).await;
        let before = h.active();
        let other = h.store.create().await.unwrap();

        let err = assert_err!(h.coordinator.select_conversation(&other).await);

        assert!(matches!(err, SessionError::TransientBackend(_)));
        assert_eq!(h.active(), before);
    }

    #[tokio::test]
    async fn selecting_unknown_conversation_is_not_found() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        let ghost = ConversationId::new("Ghost - 2025-01-01_00-00-00.json");

        let err = assert_err!(h.coordinator.select_conversation(&ghost).await);
        assert_eq!(err, SessionError::NotFound(ghost));
    }

    #[tokio::test]
    async fn deleting_last_conversation_creates_a_new_one() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        h.publisher.publish(message("assistant", "bye", 1));
        h.drain().await;
        let doomed = h.active();

        assert_ok!(h.coordinator.delete_conversation(&doomed).await);

        let active = h.active();
        assert_ne!(active, doomed);
        assert_eq!(h.coordinator.history(), [active]);
        assert!(h.coordinator.messages().is_empty());
    }

    #[tokio::test]
    async fn failed_switch_during_delete_keeps_the_conversation() {
        let mut backend = MockBackend::new();
        let mut switches = 0;
        backend.expect_set_active_conversation().returning(move |_| {
            switches += 1;
            if switches == 1 {
                Ok(())
            } else {
                Err(BackendError::Unavailable("offline".into()))
            }
        });
        let mut h = harness(backend, keyed_config()).await;
        h.publisher.publish(message("assistant", "keep me", 1));
        h.drain().await;
        let active = h.active();

        let err = assert_err!(h.coordinator.delete_conversation(&active).await);

        assert!(matches!(err, SessionError::TransientBackend(_)));
        assert_eq!(h.active(), active);
        assert_eq!(h.store.turns(&active).unwrap().len(), 1);
        assert_eq!(h.coordinator.messages().len(), 1);

        h.publisher.publish(message("assistant", "still here", 2));
        assert_eq!(h.drain().await, [ReconcileOutcome::Applied]);
        assert_eq!(h.store.turns(&active).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn message_for_a_removed_active_conversation_moves_the_pointer() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        let gone = h.active();
        assert_ok!(h.store.delete(&gone).await);

        h.publisher.publish(message("assistant", "lost", 1));
        assert_eq!(
            h.drain().await,
            [ReconcileOutcome::Dropped(MissReason::ActiveConversationGone)]
        );

        let active = h.active();
        assert_ne!(active, gone);
        assert_eq!(h.coordinator.history(), [active.clone()]);
        assert!(h.coordinator.messages().is_empty());
        assert!(h.emitted().contains(&SessionEvent::ActiveConversationChanged {
            conversation_id: active.clone(),
        }));

        h.publisher.publish(message("assistant", "saved", 2));
        assert_eq!(h.drain().await, [ReconcileOutcome::Applied]);
        assert_eq!(h.store.turns(&active).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn devices_degrade_to_empty_list() {
        let mut backend = MockBackend::accepting_switches();
        backend
            .expect_list_input_devices()
            .returning(|| Err(BackendError::Internal("no audio".into())));
        backend
            .expect_list_output_devices()
            .returning(|| Ok(vec!["Speakers".to_string()]));
        let h = harness(backend, keyed_config()).await;

        assert!(h.coordinator.list_input_devices().await.is_empty());
        assert_eq!(h.coordinator.list_output_devices().await, ["Speakers"]);
    }

    fn tick(downloaded: u64, total: u64) -> BackendEvent {
        BackendEvent::DownloadProgress(DownloadProgressPayload {
            downloaded,
            total,
            percent: 0.0,
        })
    }

    #[tokio::test]
    async fn download_progress_is_tracked_in_snapshot() {
        let mut h = harness(MockBackend::accepting_switches(), keyed_config()).await;
        h.publisher.publish(tick(0, 100));
        h.publisher.publish(tick(30, 100));
        h.drain().await;
        assert_eq!(h.coordinator.snapshot().download_percent, Some(30));

        h.publisher.publish(BackendEvent::DownloadComplete);
        h.publisher.publish(tick(100, 100));
        let outcomes = h.drain().await;

        assert_eq!(
            outcomes[1],
            ReconcileOutcome::Dropped(MissReason::DownloadAlreadyComplete)
        );
        assert_eq!(h.coordinator.snapshot().download_percent, None);
    }
}
