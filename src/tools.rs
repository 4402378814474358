//! Registry of user-defined function tools exposed to the live session.
//!
//! Tools are kept in insertion order and identified by name. Names are unique:
//! [`ToolRegistry::add_tool`] probes for a free default name and
//! [`ToolRegistry::update_tool`] refuses renames onto an existing name.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{Store, Subscription};

/// Base name for tools created with [`ToolRegistry::add_tool`].
pub const DEFAULT_TOOL_NAME: &str = "new_function";

/// How the model should treat a function response that arrives mid-speech.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseScheduling {
    SchedulingUnspecified,
    /// Add the result to context without prompting a reply.
    Silent,
    /// Reply once the model finishes its current turn.
    WhenIdle,
    /// Stop speaking and reply immediately.
    #[default]
    Interrupt,
}

/// Prompt template. There is currently a single read-aloud template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Template {
    #[default]
    #[serde(rename = "eburon-tts")]
    EburonTts,
}

/// A callable function as declared to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the arguments. Only its shape is assumed.
    #[serde(default = "empty_object_schema")]
    pub parameters: serde_json::Value,
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
    #[serde(default)]
    pub scheduling: ResponseScheduling,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "OBJECT", "properties": {} })
}

fn enabled_by_default() -> bool {
    true
}

impl ToolDescriptor {
    /// An enabled tool with an empty description and object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: empty_object_schema(),
            is_enabled: true,
            scheduling: ResponseScheduling::Interrupt,
        }
    }

    /// Function declaration entry sent to the live API.
    pub fn declaration(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}

/// Registry contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsState {
    pub tools: Vec<ToolDescriptor>,
    pub template: Template,
}

impl ToolsState {
    /// Check if a tool with `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Smallest free default name: `new_function`, then `new_function_1`, ...
    pub fn next_default_name(&self) -> String {
        let mut candidate = DEFAULT_TOOL_NAME.to_owned();
        let mut counter: u64 = 1;
        while self.exists(&candidate) {
            candidate = format!("{DEFAULT_TOOL_NAME}_{counter}");
            counter += 1;
        }
        candidate
    }
}

/// Observable, ordered tool registry.
pub struct ToolRegistry {
    store: Store<ToolsState>,
}

impl ToolRegistry {
    pub fn new(initial: ToolsState) -> Self {
        Self {
            store: Store::new("tools", initial),
        }
    }

    pub fn state(&self) -> &ToolsState {
        self.store.get()
    }

    pub fn snapshot(&self) -> Arc<ToolsState> {
        self.store.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ToolsState, &ToolsState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Accepts the only template there is; nothing changes.
    pub fn set_template(&mut self, template: Template) {
        tracing::debug!(?template, "template selection is fixed; ignoring");
    }

    /// Flip `is_enabled` on the named tool. Unknown names are ignored.
    pub fn toggle_tool(&mut self, name: &str) {
        self.store.update(|current| {
            if !current.exists(name) {
                return None;
            }
            let mut next = current.clone();
            for tool in next.tools.iter_mut().filter(|t| t.name == name) {
                tool.is_enabled = !tool.is_enabled;
                tracing::debug!(tool = name, enabled = tool.is_enabled, "tool toggled");
            }
            Some(next)
        });
    }

    /// Append a fresh tool under the next free default name and return it.
    pub fn add_tool(&mut self) -> String {
        let name = self.state().next_default_name();
        let added = name.clone();
        self.store.update(|current| {
            let mut next = current.clone();
            next.tools.push(ToolDescriptor::new(added));
            Some(next)
        });
        tracing::debug!(tool = %name, "tool added");
        name
    }

    /// Remove every tool with `name`. Unknown names are ignored.
    pub fn remove_tool(&mut self, name: &str) {
        self.store.update(|current| {
            if !current.exists(name) {
                return None;
            }
            let mut next = current.clone();
            next.tools.retain(|t| t.name != name);
            tracing::debug!(tool = name, "tool removed");
            Some(next)
        });
    }

    /// Replace the tool named `old_name` with `tool`.
    ///
    /// A rename onto a name some other tool already has is refused: the
    /// registry is left unchanged and a warning is logged.
    pub fn update_tool(&mut self, old_name: &str, tool: ToolDescriptor) {
        self.store.update(|current| {
            if tool.name != old_name && current.exists(&tool.name) {
                tracing::warn!(
                    old_name,
                    new_name = %tool.name,
                    "Tool with name \"{}\" already exists.",
                    tool.name
                );
                return None;
            }
            if !current.exists(old_name) {
                return None;
            }
            let mut next = current.clone();
            for slot in next.tools.iter_mut().filter(|t| t.name == old_name) {
                *slot = tool.clone();
            }
            tracing::debug!(old_name, new_name = %tool.name, "tool updated");
            Some(next)
        });
    }

    /// Enabled tools in registry order.
    pub fn enabled_tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.state().tools.iter().filter(|t| t.is_enabled)
    }

    /// Declarations of the enabled tools, in registry order.
    pub fn function_declarations(&self) -> Vec<serde_json::Value> {
        self.enabled_tools().map(ToolDescriptor::declaration).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(ToolsState::default())
    }
}
