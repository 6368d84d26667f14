//! Voice activity state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WireLabel;

/// Current phase of the voice interaction cycle.
///
/// ```text
///   Idle → Loading → WakeListening → Recording → Processing → Speaking
///                        ▲                                        │
///                        └────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceState {
    /// No voice session is running.
    #[default]
    Idle,

    /// The backend is loading models and opening devices.
    Loading,

    /// Waiting for the wake word.
    WakeListening,

    /// Recording the user's request.
    Recording,

    /// Transcribing and querying the LLM.
    Processing,

    /// Playing back the spoken reply.
    Speaking,
}

impl VoiceState {
    /// All states, in cycle order.
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Loading,
        Self::WakeListening,
        Self::Recording,
        Self::Processing,
        Self::Speaking,
    ];

    /// Parse a backend state label.
    ///
    /// Accepts the pipeline's PascalCase names (`WakeListening`) as well as
    /// snake_case (`wake_listening`), ignoring case.
    pub fn parse(label: &str) -> WireLabel<Self> {
        let normalised: String = label
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalised.as_str() {
            "idle" => WireLabel::Known(Self::Idle),
            "loading" => WireLabel::Known(Self::Loading),
            "wakelistening" => WireLabel::Known(Self::WakeListening),
            "recording" => WireLabel::Known(Self::Recording),
            "processing" => WireLabel::Known(Self::Processing),
            "speaking" => WireLabel::Known(Self::Speaking),
            _ => WireLabel::Unknown(label.to_string()),
        }
    }

    /// Snake-case label used on the presentation side.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::WakeListening => "wake_listening",
            Self::Recording => "recording",
            Self::Processing => "processing",
            Self::Speaking => "speaking",
        }
    }

    /// Whether a voice session is in progress.
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
