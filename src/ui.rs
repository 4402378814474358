//! Front-end display state: sidebar visibility and theme.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::UiConfig;
use crate::store::{Store, Subscription};
use crate::theme::Theme;

/// Display flags. The two fields are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub is_sidebar_open: bool,
    pub theme: Theme,
}

impl From<&UiConfig> for UiState {
    fn from(config: &UiConfig) -> Self {
        Self {
            is_sidebar_open: config.sidebar_open,
            theme: config.theme,
        }
    }
}

/// Observable holder of [`UiState`].
pub struct UiStore {
    store: Store<UiState>,
}

impl UiStore {
    pub fn new(initial: UiState) -> Self {
        Self {
            store: Store::new("ui", initial),
        }
    }

    pub fn state(&self) -> &UiState {
        self.store.get()
    }

    pub fn snapshot(&self) -> Arc<UiState> {
        self.store.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&UiState, &UiState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn toggle_sidebar(&mut self) {
        self.store.update(|s| {
            let next = UiState {
                is_sidebar_open: !s.is_sidebar_open,
                ..*s
            };
            tracing::debug!(open = next.is_sidebar_open, "sidebar toggled");
            Some(next)
        });
    }

    pub fn toggle_theme(&mut self) {
        self.store.update(|s| {
            let next = UiState {
                theme: s.theme.toggled(),
                ..*s
            };
            tracing::debug!(theme = %next.theme, "theme toggled");
            Some(next)
        });
    }
}

impl Default for UiStore {
    fn default() -> Self {
        Self::new(UiState::default())
    }
}
