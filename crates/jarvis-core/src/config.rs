//! Configuration domain types and validation.
//!
//! This module contains the user configuration record shared by the session
//! layer and the voice backend. These are pure domain types with no
//! infrastructure dependencies; persistence lives behind
//! [`ConfigStore`](crate::ports::ConfigStore).

use serde::{Deserialize, Serialize};

/// Default Gemini model used for replies.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default ElevenLabs synthesis model.
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_flash_v2_5";

/// Default ElevenLabs voice.
pub const DEFAULT_VOICE_ID: &str = "hU1ratPhBTZNviWitzAh";

/// VAD aggressiveness modes understood by the recorder.
pub const VAD_MODES: [&str; 4] = ["Quality", "LowBitrate", "Aggressive", "VeryAggressive"];

/// Frame sizes the VAD accepts.
pub const VAD_FRAME_DURATIONS_MS: [u32; 3] = [10, 20, 30];

/// System prompt used until the user supplies their own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a specialized voice assistant. \
Input is transcribed speech and may contain recognition errors; interpret the likely intent. \
Output is spoken aloud, so answer with short, natural sentences and no filler. \
Reply in the language of the user. \
Return a single fact as just the answer, lists as at most 5 numbered items, \
and code only inside [[copy]] and [[/copy]] tags.";

/// How the user talks to the assistant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Wake word and microphone.
    #[default]
    Audio,
    /// Typed prompts.
    Text,
}

/// User configuration.
///
/// Keys are snake_case on disk. Missing keys take their defaults so older
/// files keep loading after fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Picovoice access key for the wake-word engine.
    pub porcupine_key: String,
    /// Gemini API key for replies and titles.
    pub gemini_key: String,
    /// ElevenLabs API key for speech synthesis.
    pub elevenlabs_key: String,

    /// Whisper transcription language.
    pub whisper_language: String,
    pub default_microphone_index: u32,
    pub default_microphone_name: Option<String>,
    pub default_output_device_name: Option<String>,

    pub gemini_model: String,
    pub elevenlabs_model: String,
    pub voice_id: String,
    pub llm_system_prompt: String,

    /// One of [`VAD_MODES`].
    pub vad_mode: String,
    /// Wake-word sensitivity (0.0–1.0).
    pub wwd_sensitivity: f32,
    /// How long conversation context stays relevant to the LLM.
    pub context_window_expiration_seconds: u64,

    /// One of [`VAD_FRAME_DURATIONS_MS`].
    pub frame_duration_ms: u32,
    pub silence_threshold_seconds: u32,
    pub speech_trigger_frames: u32,
    pub frame_length_wwd: u32,

    pub dock_position: Option<String>,
    pub input_mode: Option<InputMode>,
    pub theme: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            porcupine_key: String::new(),
            gemini_key: String::new(),
            elevenlabs_key: String::new(),
            whisper_language: "en".to_string(),
            default_microphone_index: 0,
            default_microphone_name: None,
            default_output_device_name: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            elevenlabs_model: DEFAULT_ELEVENLABS_MODEL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            llm_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            vad_mode: "Quality".to_string(),
            wwd_sensitivity: 0.8,
            context_window_expiration_seconds: 1800,
            frame_duration_ms: 30,
            silence_threshold_seconds: 1,
            speech_trigger_frames: 8,
            frame_length_wwd: 512,
            dock_position: Some("right".to_string()),
            input_mode: Some(InputMode::Audio),
            theme: Some("emerald".to_string()),
        }
    }
}

impl Config {
    /// Whether an LLM credential is configured.
    pub fn has_llm_credential(&self) -> bool {
        !self.gemini_key.trim().is_empty()
    }

    /// Whether the wake-word engine can be started.
    pub fn has_wake_word_credential(&self) -> bool {
        !self.porcupine_key.trim().is_empty()
    }

    /// Names of the credentials a voice session needs but does not have.
    pub fn missing_voice_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.has_wake_word_credential() {
            missing.push("porcupine_key");
        }
        if !self.has_llm_credential() {
            missing.push("gemini_key");
        }
        if self.elevenlabs_key.trim().is_empty() {
            missing.push("elevenlabs_key");
        }
        missing
    }

    /// Effective input mode (with default fallback).
    pub fn effective_input_mode(&self) -> InputMode {
        self.input_mode.unwrap_or_default()
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Wake-word sensitivity must be between 0.0 and 1.0, got {0}")]
    InvalidSensitivity(f32),

    #[error("VAD mode must be one of Quality, LowBitrate, Aggressive, VeryAggressive, got {0:?}")]
    InvalidVadMode(String),

    #[error("Frame duration must be 10, 20 or 30 ms, got {0}")]
    InvalidFrameDuration(u32),

    #[error("Speech trigger frames must be at least 1")]
    InvalidTriggerFrames,

    #[error("Wake-word frame length must be non-zero")]
    InvalidFrameLength,

    #[error("Whisper language cannot be empty")]
    EmptyLanguage,
}

/// Validate configuration values.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.wwd_sensitivity) {
        return Err(ConfigError::InvalidSensitivity(config.wwd_sensitivity));
    }

    if !VAD_MODES.contains(&config.vad_mode.as_str()) {
        return Err(ConfigError::InvalidVadMode(config.vad_mode.clone()));
    }

    if !VAD_FRAME_DURATIONS_MS.contains(&config.frame_duration_ms) {
        return Err(ConfigError::InvalidFrameDuration(config.frame_duration_ms));
    }

    if config.speech_trigger_frames == 0 {
        return Err(ConfigError::InvalidTriggerFrames);
    }

    if config.frame_length_wwd == 0 {
        return Err(ConfigError::InvalidFrameLength);
    }

    if config.whisper_language.trim().is_empty() {
        return Err(ConfigError::EmptyLanguage);
    }

    Ok(())
}
