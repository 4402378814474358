//! Startup configuration for the interpreter state.
//!
//! Configuration only seeds the initial values of the stores. Runtime changes
//! are never written back.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, StateError};
use crate::prompt::{TAGLISH_LOCALE, VoiceStyle};
use crate::theme::Theme;

/// Live API model requested by default.
pub const DEFAULT_LIVE_API_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Prebuilt voice used by default.
pub const DEFAULT_VOICE: &str = "Orus";

/// Default speech rate multiplier.
pub const DEFAULT_SPEECH_RATE: f64 = 1.0;

/// Default background pad volume.
pub const DEFAULT_BACKGROUND_PAD_VOLUME: f64 = 0.2;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial interpreter settings.
    pub settings: SettingsConfig,
    /// Initial display state.
    pub ui: UiConfig,
}

/// Initial interpreter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Target language, quoted verbatim into the system prompt.
    pub language: String,
    /// Speech rate multiplier (`1.0` = natural pace).
    pub speech_rate: f64,
    /// Voice persona.
    pub voice_style: VoiceStyle,
    /// Live API model identifier.
    pub model: String,
    /// Prebuilt voice name.
    pub voice: String,
    /// Whether the ambient background pad plays under speech.
    pub background_pad_enabled: bool,
    /// Background pad volume in `[0, 1]`.
    pub background_pad_volume: f64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            language: TAGLISH_LOCALE.to_owned(),
            speech_rate: DEFAULT_SPEECH_RATE,
            voice_style: VoiceStyle::Conversational,
            model: DEFAULT_LIVE_API_MODEL.to_owned(),
            voice: DEFAULT_VOICE.to_owned(),
            background_pad_enabled: false,
            background_pad_volume: DEFAULT_BACKGROUND_PAD_VOLUME,
        }
    }
}

/// Initial display state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Colour theme.
    pub theme: Theme,
    /// Whether the sidebar starts open.
    pub sidebar_open: bool,
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| StateError::Config(format!("invalid config: {e}")))
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults. Any other read failure or a parse
    /// failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let config = Self::from_toml(&raw).map_err(|e| match e {
                    StateError::Config(message) => {
                        StateError::Config(format!("{}: {message}", path.display()))
                    }
                    other => other,
                })?;
                tracing::info!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(StateError::Io(e)),
        }
    }

    /// Load configuration from [`crate::app_dirs::config_file`].
    pub fn load() -> Result<Self> {
        Self::load_from(&crate::app_dirs::config_file())
    }
}
