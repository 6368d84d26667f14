//! Single-task session actor.
//!
//! The runner moves a [`SessionCoordinator`] into one tokio task and drives
//! it from four sources: backend notifications, commands from
//! [`SessionHandle`]s, the liveness ticker, and cancellation. Each reaction
//! runs to completion before the next one is taken.

use std::time::Duration;

use jarvis_core::config::Config;
use jarvis_core::domain::{ConversationId, TitleResult};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::channel::EventStream;
use crate::coordinator::{SessionCoordinator, SessionSnapshot};
use crate::error::SessionError;

/// Default liveness probe interval.
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Runner settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How often the backend is asked whether the voice loop is running.
    pub liveness_interval: Duration,
    /// Run [`SessionCoordinator::initialize`] before taking commands.
    pub initialize: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            initialize: true,
        }
    }
}

/// A request for the session actor.
#[derive(Debug)]
pub enum SessionCommand {
    EnsureHistory(Reply<Vec<ConversationId>>),
    SelectConversation(ConversationId, Reply<()>),
    NewConversation(Reply<ConversationId>),
    SendText(String, Reply<String>),
    AppendSystemNotice(String, Reply<()>),
    RenameConversation(ConversationId, String, Reply<TitleResult>),
    DeleteConversation(ConversationId, Reply<()>),
    GenerateAndRename(ConversationId, Reply<TitleResult>),
    StartVoice(Reply<()>),
    StopVoice(Reply<()>),
    LoadConfig(Reply<Config>),
    SaveConfig(Box<Config>, Reply<()>),
    ListInputDevices(Reply<Vec<String>>),
    ListOutputDevices(Reply<Vec<String>>),
    Snapshot(Reply<SessionSnapshot>),
}

/// Spawns the session actor.
pub struct SessionRunner;

impl SessionRunner {
    /// Move `coordinator` into a new task fed by `events`.
    pub fn spawn(
        coordinator: SessionCoordinator,
        events: EventStream,
        config: RunnerConfig,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();
        let handle = SessionHandle {
            tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(run(coordinator, events, rx, config, cancel));
        (handle, task)
    }
}

async fn run(
    mut coordinator: SessionCoordinator,
    mut events: EventStream,
    mut commands: mpsc::Receiver<SessionCommand>,
    config: RunnerConfig,
    cancel: CancellationToken,
) {
    if config.initialize {
        if let Err(e) = coordinator.initialize().await {
            tracing::error!(error = %e, "Session initialization failed");
        }
    }

    let mut ticker = interval(config.liveness_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_ms = config.liveness_interval.as_millis(),
        "Session runner started"
    );

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("Session runner cancelled");
                break;
            }
            // Backend notifications go before commands so a busy caller
            // cannot hold them back.
            Some(envelope) = events.recv() => {
                coordinator.handle_envelope(envelope).await;
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("All session handles dropped");
                    break;
                };
                dispatch(&mut coordinator, command).await;
            }
            _ = ticker.tick() => {
                coordinator.poll_liveness().await;
            }
        }
    }

    info!("Session runner stopped");
}

async fn dispatch(coordinator: &mut SessionCoordinator, command: SessionCommand) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        SessionCommand::EnsureHistory(reply) => {
            let _ = reply.send(coordinator.ensure_history().await);
        }
        SessionCommand::SelectConversation(id, reply) => {
            let _ = reply.send(coordinator.select_conversation(&id).await);
        }
        SessionCommand::NewConversation(reply) => {
            let _ = reply.send(coordinator.new_conversation().await);
        }
        SessionCommand::SendText(prompt, reply) => {
            let _ = reply.send(coordinator.send_text(&prompt).await);
        }
        SessionCommand::AppendSystemNotice(text, reply) => {
            coordinator.append_system_notice(&text).await;
            let _ = reply.send(Ok(()));
        }
        SessionCommand::RenameConversation(id, title, reply) => {
            let _ = reply.send(coordinator.rename_conversation(&id, &title).await);
        }
        SessionCommand::DeleteConversation(id, reply) => {
            let _ = reply.send(coordinator.delete_conversation(&id).await);
        }
        SessionCommand::GenerateAndRename(id, reply) => {
            let _ = reply.send(coordinator.generate_and_rename_conversation(&id).await);
        }
        SessionCommand::StartVoice(reply) => {
            let _ = reply.send(coordinator.start_voice_session().await);
        }
        SessionCommand::StopVoice(reply) => {
            let _ = reply.send(coordinator.stop_voice_session().await);
        }
        SessionCommand::LoadConfig(reply) => {
            let _ = reply.send(coordinator.load_config().await);
        }
        SessionCommand::SaveConfig(config, reply) => {
            let _ = reply.send(coordinator.save_config(*config).await);
        }
        SessionCommand::ListInputDevices(reply) => {
            let _ = reply.send(Ok(coordinator.list_input_devices().await));
        }
        SessionCommand::ListOutputDevices(reply) => {
            let _ = reply.send(Ok(coordinator.list_output_devices().await));
        }
        SessionCommand::Snapshot(reply) => {
            let _ = reply.send(Ok(coordinator.snapshot()));
        }
    }
}

/// Cloneable handle to a running session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    cancel: CancellationToken,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SessionError::Shutdown)?;
        response.await.map_err(|_| SessionError::Shutdown)?
    }

    pub async fn ensure_history(&self) -> Result<Vec<ConversationId>, SessionError> {
        self.request(SessionCommand::EnsureHistory).await
    }

    pub async fn select_conversation(&self, id: ConversationId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SelectConversation(id, reply))
            .await
    }

    pub async fn new_conversation(&self) -> Result<ConversationId, SessionError> {
        self.request(SessionCommand::NewConversation).await
    }

    pub async fn send_text(&self, prompt: impl Into<String>) -> Result<String, SessionError> {
        let prompt = prompt.into();
        self.request(|reply| SessionCommand::SendText(prompt, reply))
            .await
    }

    pub async fn append_system_notice(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        self.request(|reply| SessionCommand::AppendSystemNotice(text, reply))
            .await
    }

    pub async fn rename_conversation(
        &self,
        id: ConversationId,
        title: impl Into<String>,
    ) -> Result<TitleResult, SessionError> {
        let title = title.into();
        self.request(|reply| SessionCommand::RenameConversation(id, title, reply))
            .await
    }

    pub async fn delete_conversation(&self, id: ConversationId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::DeleteConversation(id, reply))
            .await
    }

    pub async fn generate_and_rename_conversation(
        &self,
        id: ConversationId,
    ) -> Result<TitleResult, SessionError> {
        self.request(|reply| SessionCommand::GenerateAndRename(id, reply))
            .await
    }

    pub async fn start_voice_session(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::StartVoice).await
    }

    pub async fn stop_voice_session(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::StopVoice).await
    }

    pub async fn load_config(&self) -> Result<Config, SessionError> {
        self.request(SessionCommand::LoadConfig).await
    }

    pub async fn save_config(&self, config: Config) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SaveConfig(Box::new(config), reply))
            .await
    }

    pub async fn list_input_devices(&self) -> Result<Vec<String>, SessionError> {
        self.request(SessionCommand::ListInputDevices).await
    }

    pub async fn list_output_devices(&self) -> Result<Vec<String>, SessionError> {
        self.request(SessionCommand::ListOutputDevices).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(SessionCommand::Snapshot).await
    }

    /// Stop the actor. Pending commands fail with [`SessionError::Shutdown`].
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}
