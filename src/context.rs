//! Application context: the single set of stores for a running front-end.
//!
//! Build one [`AppContext`] at startup and pass it by reference to whatever
//! renders or drives the session. Nothing in the crate keeps global state.

use serde::Serialize;

use crate::config::AppConfig;
use crate::settings::{Settings, SettingsStore};
use crate::tools::{ToolRegistry, ToolsState};
use crate::turns::{ConversationTurn, TurnLog};
use crate::ui::{UiState, UiStore};

/// All state containers.
pub struct AppContext {
    pub settings: SettingsStore,
    pub ui: UiStore,
    pub tools: ToolRegistry,
    pub turns: TurnLog,
}

/// Point-in-time copy of every container, for rendering or transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub settings: Settings,
    pub ui: UiState,
    pub tools: ToolsState,
    pub turns: Vec<ConversationTurn>,
}

impl AppContext {
    /// Create the stores from startup configuration.
    pub fn new(config: &AppConfig) -> Self {
        tracing::debug!(
            language = %config.settings.language,
            style = %config.settings.voice_style,
            theme = %config.ui.theme,
            "initializing app context"
        );
        Self {
            settings: SettingsStore::new(Settings::from_config(&config.settings)),
            ui: UiStore::new(UiState::from(&config.ui)),
            tools: ToolRegistry::default(),
            turns: TurnLog::new(),
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            settings: self.settings.state().clone(),
            ui: *self.ui.state(),
            tools: self.tools.state().clone(),
            turns: self.turns.turns().to_vec(),
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::prompt::{VoiceStyle, build_prompt};
    use crate::theme::Theme;

    #[test]
    fn default_context_matches_startup_defaults() {
        let ctx = AppContext::default();
        let state = ctx.snapshot();
        assert_eq!(state.settings.language, "Taglish (Philippines)");
        assert_eq!(state.settings.voice_style, VoiceStyle::Conversational);
        assert!(!state.settings.background_pad_enabled);
        assert!(state.tools.tools.is_empty());
        assert!(state.turns.is_empty());
        assert_eq!(state.ui.theme, Theme::Dark);
        assert!(!state.ui.is_sidebar_open);
    }

    #[test]
    fn config_seeds_every_store() {
        let mut config = AppConfig::default();
        config.settings.language = "Japanese".to_owned();
        config.settings.speech_rate = 0.8;
        config.settings.voice_style = VoiceStyle::Breathy;
        config.ui.theme = Theme::Light;
        config.ui.sidebar_open = true;

        let ctx = AppContext::new(&config);
        assert_eq!(
            ctx.settings.state().system_prompt,
            build_prompt("Japanese", 0.8, VoiceStyle::Breathy)
        );
        assert_eq!(ctx.ui.state().theme, Theme::Light);
        assert!(ctx.ui.state().is_sidebar_open);
    }

    #[test]
    fn stores_are_independent() {
        let mut ctx = AppContext::default();
        let settings_before = ctx.settings.snapshot();
        ctx.ui.toggle_theme();
        ctx.tools.add_tool();
        assert_eq!(*ctx.settings.snapshot(), *settings_before);
    }
}
