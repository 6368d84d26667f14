//! The authoritative voice activity state.
//!
//! ```text
//!   Idle → Loading → WakeListening → Recording → Processing → Speaking → Idle
//!                        ▲               │            │           │
//!                        └───────────────┴────────────┴───────────┘
//! ```
//!
//! Backend notifications always win. Local code may only request a start
//! (from idle) or a stop (from wake listening), and the state moves only
//! once the backend acknowledges. Every other phase ends through the backend
//! or the liveness poll.

use std::sync::Arc;

use jarvis_core::domain::{VoiceState, WireLabel};
use jarvis_core::events::TransitionCause;
use jarvis_core::ports::VoiceBackend;
use tracing::{debug, info, warn};

use crate::error::{VoiceRequest, VoiceStateError};

/// An applied state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VoiceState,
    pub to: VoiceState,
    pub cause: TransitionCause,
}

/// Whether the pipeline is expected to move from `from` to `to`.
pub const fn is_expected(from: VoiceState, to: VoiceState) -> bool {
    use VoiceState::{Idle, Loading, Processing, Recording, Speaking, WakeListening};
    matches!(
        (from, to),
        (_, Idle)
            | (Idle, Loading | WakeListening)
            | (Loading, WakeListening)
            | (WakeListening, Recording)
            | (Recording, Processing | WakeListening)
            | (Processing, Speaking | WakeListening)
            | (Speaking, WakeListening)
    )
}

/// Owner of the current [`VoiceState`].
pub struct VoiceStateMachine {
    state: VoiceState,
    backend: Arc<dyn VoiceBackend>,
}

impl VoiceStateMachine {
    pub fn new(backend: Arc<dyn VoiceBackend>) -> Self {
        Self {
            state: VoiceState::Idle,
            backend,
        }
    }

    pub const fn state(&self) -> VoiceState {
        self.state
    }

    /// Apply a backend state label. Unknown labels change nothing.
    pub fn apply_backend_label(&mut self, label: &str) -> Result<Option<Transition>, String> {
        match VoiceState::parse(label) {
            WireLabel::Known(state) => Ok(self.apply_backend(state)),
            WireLabel::Unknown(raw) => {
                warn!(label = %raw, state = %self.state, "Ignoring unknown voice state label");
                Err(raw)
            }
        }
    }

    /// Apply a backend-reported state.
    pub fn apply_backend(&mut self, to: VoiceState) -> Option<Transition> {
        if !is_expected(self.state, to) && self.state != to {
            debug!(from = %self.state, to = %to, "Irregular voice state transition from backend");
        }
        self.set_state(to, TransitionCause::Backend)
    }

    /// Ask the backend to start listening for the wake word.
    pub async fn request_start(&mut self) -> Result<Option<Transition>, VoiceStateError> {
        if self.state != VoiceState::Idle {
            return Err(VoiceStateError::InvalidRequest {
                from: self.state,
                requested: VoiceRequest::Start,
            });
        }

        self.backend.start_voice_session().await?;
        info!("Voice session started");
        Ok(self.set_state(VoiceState::WakeListening, TransitionCause::Request))
    }

    /// Ask the backend to stop listening for the wake word.
    pub async fn request_stop(&mut self) -> Result<Option<Transition>, VoiceStateError> {
        if self.state != VoiceState::WakeListening {
            return Err(VoiceStateError::InvalidRequest {
                from: self.state,
                requested: VoiceRequest::Stop,
            });
        }

        self.backend.stop_voice_session().await?;
        info!("Voice session stopped");
        Ok(self.set_state(VoiceState::Idle, TransitionCause::Request))
    }

    /// Probe the backend once and force `idle` if it is no longer running.
    ///
    /// A failed probe is logged and leaves the state alone.
    pub async fn poll_liveness(&mut self) -> Option<Transition> {
        match self.backend.session_status().await {
            Ok(true) => None,
            Ok(false) => {
                if self.state.is_active() {
                    warn!(from = %self.state, "Backend not running, forcing idle");
                }
                self.set_state(VoiceState::Idle, TransitionCause::LivenessPoll)
            }
            Err(e) => {
                warn!(error = %e, "Liveness probe failed");
                None
            }
        }
    }

    fn set_state(&mut self, to: VoiceState, cause: TransitionCause) -> Option<Transition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        debug!(from = %from, to = %to, ?cause, "Voice state transition");
        self.state = to;
        Some(Transition { from, to, cause })
    }
}
