//! Interpreter settings and the derived system prompt.
//!
//! `system_prompt` is derived: every change to `language`, `speech_rate`, or
//! `voice_style` rebuilds it in the same transition via
//! [`build_prompt`]. [`SettingsStore::set_system_prompt`] overrides it
//! directly until the next such change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SettingsConfig;
use crate::prompt::{VoiceStyle, build_prompt};
use crate::store::{Store, Subscription};

/// Current interpreter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub language: String,
    pub speech_rate: f64,
    pub voice_style: VoiceStyle,
    pub system_prompt: String,
    pub model: String,
    pub voice: String,
    pub background_pad_enabled: bool,
    pub background_pad_volume: f64,
}

/// The fields a live session is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProfile<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub system_prompt: &'a str,
}

impl Settings {
    /// Build settings from config, deriving the prompt.
    pub fn from_config(config: &SettingsConfig) -> Self {
        Self {
            language: config.language.clone(),
            speech_rate: config.speech_rate,
            voice_style: config.voice_style,
            system_prompt: build_prompt(&config.language, config.speech_rate, config.voice_style),
            model: config.model.clone(),
            voice: config.voice.clone(),
            background_pad_enabled: config.background_pad_enabled,
            background_pad_volume: config.background_pad_volume,
        }
    }

    /// What the session client needs to open a connection.
    pub fn session_profile(&self) -> SessionProfile<'_> {
        SessionProfile {
            model: &self.model,
            voice: &self.voice,
            system_prompt: &self.system_prompt,
        }
    }

    fn with_rebuilt_prompt(mut self) -> Self {
        self.system_prompt = build_prompt(&self.language, self.speech_rate, self.voice_style);
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&SettingsConfig::default())
    }
}

/// Observable holder of [`Settings`].
pub struct SettingsStore {
    store: Store<Settings>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            store: Store::new("settings", initial),
        }
    }

    pub fn state(&self) -> &Settings {
        self.store.get()
    }

    pub fn snapshot(&self) -> Arc<Settings> {
        self.store.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Settings, &Settings) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    fn patch(&mut self, field: &'static str, f: impl FnOnce(&mut Settings)) {
        self.store.update(|current| {
            let mut next = current.clone();
            f(&mut next);
            tracing::debug!(field, "settings updated");
            Some(next)
        });
    }

    /// Replace the prompt text directly. Not validated.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.patch("system_prompt", |s| s.system_prompt = prompt);
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        self.patch("model", |s| s.model = model);
    }

    pub fn set_voice(&mut self, voice: impl Into<String>) {
        let voice = voice.into();
        self.patch("voice", |s| s.voice = voice);
    }

    pub fn set_background_pad_enabled(&mut self, enabled: bool) {
        self.patch("background_pad_enabled", |s| {
            s.background_pad_enabled = enabled;
        });
    }

    pub fn set_background_pad_volume(&mut self, volume: f64) {
        self.patch("background_pad_volume", |s| {
            s.background_pad_volume = volume;
        });
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        self.store.update(|current| {
            tracing::debug!(language = %language, "language changed; rebuilding prompt");
            Some(
                Settings {
                    language,
                    ..current.clone()
                }
                .with_rebuilt_prompt(),
            )
        });
    }

    pub fn set_speech_rate(&mut self, rate: f64) {
        self.store.update(|current| {
            tracing::debug!(rate, "speech rate changed; rebuilding prompt");
            Some(
                Settings {
                    speech_rate: rate,
                    ..current.clone()
                }
                .with_rebuilt_prompt(),
            )
        });
    }

    pub fn set_voice_style(&mut self, style: VoiceStyle) {
        self.store.update(|current| {
            tracing::debug!(style = %style, "voice style changed; rebuilding prompt");
            Some(
                Settings {
                    voice_style: style,
                    ..current.clone()
                }
                .with_rebuilt_prompt(),
            )
        });
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
