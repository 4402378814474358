//! Versioned command/response/event envelopes for the host bridge.

use serde::{Deserialize, Serialize};

/// Contract version for host envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Commands understood by the host bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "state.get")]
    StateGet,
    #[serde(rename = "settings.set")]
    SettingsSet,
    #[serde(rename = "settings.prompt_preview")]
    SettingsPromptPreview,
    #[serde(rename = "ui.toggle_sidebar")]
    UiToggleSidebar,
    #[serde(rename = "ui.toggle_theme")]
    UiToggleTheme,
    #[serde(rename = "tools.toggle")]
    ToolsToggle,
    #[serde(rename = "tools.add")]
    ToolsAdd,
    #[serde(rename = "tools.remove")]
    ToolsRemove,
    #[serde(rename = "tools.update")]
    ToolsUpdate,
    #[serde(rename = "tools.declarations")]
    ToolsDeclarations,
    #[serde(rename = "turns.add")]
    TurnsAdd,
    #[serde(rename = "turns.update_last")]
    TurnsUpdateLast,
    #[serde(rename = "turns.update")]
    TurnsUpdate,
    #[serde(rename = "turns.clear")]
    TurnsClear,
    #[serde(rename = "runtime.stop")]
    RuntimeStop,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::StateGet => "state.get",
            Self::SettingsSet => "settings.set",
            Self::SettingsPromptPreview => "settings.prompt_preview",
            Self::UiToggleSidebar => "ui.toggle_sidebar",
            Self::UiToggleTheme => "ui.toggle_theme",
            Self::ToolsToggle => "tools.toggle",
            Self::ToolsAdd => "tools.add",
            Self::ToolsRemove => "tools.remove",
            Self::ToolsUpdate => "tools.update",
            Self::ToolsDeclarations => "tools.declarations",
            Self::TurnsAdd => "turns.add",
            Self::TurnsUpdateLast => "turns.update_last",
            Self::TurnsUpdate => "turns.update",
            Self::TurnsClear => "turns.clear",
            Self::RuntimeStop => "runtime.stop",
        }
    }
}

/// A versioned response envelope from host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// A versioned command envelope from frontend -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and required identifiers.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, EVENT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A versioned event envelope from host -> frontend, one per state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build a v1 event envelope with a fresh id.
    #[must_use]
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: uuid::Uuid::new_v4().to_string(),
            event: event.into(),
            payload,
        }
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContractError {}
