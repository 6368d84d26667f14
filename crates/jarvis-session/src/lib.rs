//! Session orchestration for the jarvis voice assistant.
//!
//! - [`VoiceStateMachine`]: the authoritative voice activity state
//! - [`EventChannel`]: ordered, generation-stamped backend notifications
//! - [`SessionCoordinator`]: active conversation, projection, auto-titling
//! - [`SessionRunner`]: drives a coordinator from one tokio task

#![deny(unused_crate_dependencies)]

pub mod channel;
pub mod coordinator;
pub mod error;
pub mod reconcile;
pub mod runner;
pub mod titling;
pub mod voice_state;

#[cfg(test)]
mod test_support;

pub use channel::{Envelope, EventChannel, EventPublisher, EventStream, Generation, Subscription};
pub use coordinator::{
    GEMINI_KEY_NOTICE, PORCUPINE_KEY_NOTICE, SessionCoordinator, SessionDeps, SessionSnapshot,
};
pub use error::{SessionError, VoiceRequest, VoiceStateError};
pub use reconcile::{DownloadTracker, MessageProjection, MissReason, ReconcileOutcome};
pub use runner::{RunnerConfig, SessionCommand, SessionHandle, SessionRunner};
pub use voice_state::{Transition, VoiceStateMachine};

// Dev-dependencies used only by integration tests
#[cfg(test)]
use chrono as _;
#[cfg(test)]
use jarvis_store as _;
#[cfg(test)]
use tempfile as _;
