//! Eburon: client-side state for a real-time voice interpreter front-end.
//!
//! The crate holds the state a rendering layer and a live speech session
//! share:
//!
//! - **Settings**: target language, speech rate, voice persona, model and
//!   voice, plus the derived interpreter system prompt
//!   ([`prompt::build_prompt`]).
//! - **UI**: sidebar visibility and colour theme.
//! - **Tools**: user-defined function declarations with unique names.
//! - **Turns**: the conversation transcript.
//!
//! Each container is an observable [`store::Store`]; the four are grouped in
//! an [`AppContext`] created once at startup from an [`AppConfig`] and passed
//! by reference. The [`host`] module exposes the same operations over
//! newline-delimited JSON for headless embedding.

pub mod app_dirs;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod prompt;
pub mod settings;
pub mod store;
pub mod theme;
pub mod tools;
pub mod turns;
pub mod ui;

pub use config::AppConfig;
pub use context::{AppContext, StateSnapshot};
pub use error::{Result, StateError};
pub use prompt::{VoiceStyle, build_prompt};
pub use settings::{Settings, SettingsStore};
pub use store::Subscription;
pub use theme::Theme;
pub use tools::{ToolDescriptor, ToolRegistry};
pub use turns::{ConversationTurn, NewTurn, Role, TurnLog, TurnUpdate};
pub use ui::{UiState, UiStore};
