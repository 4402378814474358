//! Command router that applies host commands to an [`AppContext`].
//!
//! Every store is subscribed at construction; each state transition becomes
//! an [`EventEnvelope`] queued for the transport to drain after the command
//! that caused it.

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::context::AppContext;
use crate::error::{Result, StateError};
use crate::host::contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};
use crate::prompt::{VoiceStyle, build_prompt};
use crate::store::Subscription;
use crate::tools::ToolDescriptor;
use crate::turns::{NewTurn, TurnUpdate};

/// Fields accepted by `settings.set`. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsPatch {
    language: Option<String>,
    speech_rate: Option<f64>,
    voice_style: Option<VoiceStyle>,
    model: Option<String>,
    voice: Option<String>,
    background_pad_enabled: Option<bool>,
    background_pad_volume: Option<f64>,
    system_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptPreview {
    language: String,
    #[serde(default = "unit_rate")]
    speech_rate: f64,
    #[serde(default)]
    voice_style: VoiceStyle,
}

fn unit_rate() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct ToolName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ToolUpdate {
    old_name: String,
    tool: ToolDescriptor,
}

#[derive(Debug, Deserialize)]
struct TurnById {
    id: String,
    update: TurnUpdate,
}

fn parse_payload<T: for<'de> Deserialize<'de>>(envelope: &CommandEnvelope) -> Result<T> {
    serde_json::from_value(envelope.payload.clone()).map_err(|e| {
        StateError::Protocol(format!(
            "invalid payload for {}: {e}",
            envelope.command.as_str()
        ))
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize state");
        serde_json::Value::Null
    })
}

/// Routes host commands to the stores and collects change events.
pub struct HostHandler {
    ctx: AppContext,
    events: mpsc::UnboundedReceiver<EventEnvelope>,
    _subscriptions: Vec<Subscription>,
}

impl HostHandler {
    /// Wrap `ctx`, subscribing to all four stores.
    pub fn new(ctx: AppContext) -> Self {
        let (tx, events) = mpsc::unbounded_channel();

        let emit = move |event: &'static str| {
            let tx = tx.clone();
            move |payload: serde_json::Value| {
                if tx.send(EventEnvelope::new(event, payload)).is_err() {
                    tracing::debug!(event, "event receiver dropped");
                }
            }
        };

        let settings_tx = emit("settings.changed");
        let ui_tx = emit("ui.changed");
        let tools_tx = emit("tools.changed");
        let turns_tx = emit("turns.changed");

        let subscriptions = vec![
            ctx.settings.subscribe(move |s, _| settings_tx(to_json(s))),
            ctx.ui.subscribe(move |s, _| ui_tx(to_json(s))),
            ctx.tools.subscribe(move |s, _| tools_tx(to_json(s))),
            ctx.turns.subscribe(move |s, _| turns_tx(to_json(s))),
        ];

        Self {
            ctx,
            events,
            _subscriptions: subscriptions,
        }
    }

    /// Read access to the wrapped context.
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Validate and route one command, always producing a response.
    pub fn handle(&mut self, envelope: &CommandEnvelope) -> ResponseEnvelope {
        if let Err(e) = envelope.validate() {
            tracing::warn!(request_id = %envelope.request_id, error = %e, "rejected envelope");
            return ResponseEnvelope::error(envelope.request_id.clone(), e.to_string());
        }
        match self.route(envelope) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    request_id = %envelope.request_id,
                    command = envelope.command.as_str(),
                    error = %e,
                    "command failed"
                );
                ResponseEnvelope::error(envelope.request_id.clone(), e.to_string())
            }
        }
    }

    /// Events produced since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    fn route(&mut self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let id = envelope.request_id.clone();
        let payload = match envelope.command {
            CommandName::HostPing => serde_json::json!({"pong": true}),
            CommandName::StateGet => to_json(&self.ctx.snapshot()),
            CommandName::SettingsSet => {
                let patch: SettingsPatch = parse_payload(envelope)?;
                self.apply_settings(patch);
                to_json(self.ctx.settings.state())
            }
            CommandName::SettingsPromptPreview => {
                let preview: PromptPreview = parse_payload(envelope)?;
                serde_json::json!({
                    "system_prompt": build_prompt(
                        &preview.language,
                        preview.speech_rate,
                        preview.voice_style
                    )
                })
            }
            CommandName::UiToggleSidebar => {
                self.ctx.ui.toggle_sidebar();
                to_json(self.ctx.ui.state())
            }
            CommandName::UiToggleTheme => {
                self.ctx.ui.toggle_theme();
                to_json(self.ctx.ui.state())
            }
            CommandName::ToolsToggle => {
                let ToolName { name } = parse_payload(envelope)?;
                self.ctx.tools.toggle_tool(&name);
                to_json(self.ctx.tools.state())
            }
            CommandName::ToolsAdd => {
                let name = self.ctx.tools.add_tool();
                serde_json::json!({ "name": name, "tools": to_json(self.ctx.tools.state()) })
            }
            CommandName::ToolsRemove => {
                let ToolName { name } = parse_payload(envelope)?;
                self.ctx.tools.remove_tool(&name);
                to_json(self.ctx.tools.state())
            }
            CommandName::ToolsUpdate => {
                let ToolUpdate { old_name, tool } = parse_payload(envelope)?;
                self.ctx.tools.update_tool(&old_name, tool);
                to_json(self.ctx.tools.state())
            }
            CommandName::ToolsDeclarations => {
                let declarations = self.ctx.tools.function_declarations();
                serde_json::json!({ "function_declarations": declarations })
            }
            CommandName::TurnsAdd => {
                let turn: NewTurn = parse_payload(envelope)?;
                self.ctx.turns.add_turn(turn);
                serde_json::json!({ "count": self.ctx.turns.len() })
            }
            CommandName::TurnsUpdateLast => {
                let update: TurnUpdate = parse_payload(envelope)?;
                self.ctx.turns.update_last_turn(update);
                serde_json::json!({ "count": self.ctx.turns.len() })
            }
            CommandName::TurnsUpdate => {
                let TurnById { id: turn_id, update } = parse_payload(envelope)?;
                self.ctx.turns.update_turn(&turn_id, update);
                serde_json::json!({ "count": self.ctx.turns.len() })
            }
            CommandName::TurnsClear => {
                self.ctx.turns.clear_turns();
                serde_json::json!({ "count": 0 })
            }
            CommandName::RuntimeStop => serde_json::json!({"stopping": true}),
        };
        Ok(ResponseEnvelope::ok(id, payload))
    }

    /// Plain fields first, then the prompt inputs, then a manual prompt so an
    /// explicit override wins over the rebuilt one.
    fn apply_settings(&mut self, patch: SettingsPatch) {
        let settings = &mut self.ctx.settings;
        if let Some(model) = patch.model {
            settings.set_model(model);
        }
        if let Some(voice) = patch.voice {
            settings.set_voice(voice);
        }
        if let Some(enabled) = patch.background_pad_enabled {
            settings.set_background_pad_enabled(enabled);
        }
        if let Some(volume) = patch.background_pad_volume {
            settings.set_background_pad_volume(volume);
        }
        if let Some(language) = patch.language {
            settings.set_language(language);
        }
        if let Some(rate) = patch.speech_rate {
            settings.set_speech_rate(rate);
        }
        if let Some(style) = patch.voice_style {
            settings.set_voice_style(style);
        }
        if let Some(prompt) = patch.system_prompt {
            settings.set_system_prompt(prompt);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn cmd(command: CommandName, payload: serde_json::Value) -> CommandEnvelope {
        CommandEnvelope::new("req-1", command, payload)
    }

    #[test]
    fn ping_answers_pong() {
        let mut handler = HostHandler::new(AppContext::default());
        let resp = handler.handle(&cmd(CommandName::HostPing, serde_json::json!({})));
        assert!(resp.ok);
        assert_eq!(resp.payload["pong"], true);
        assert!(handler.drain_events().is_empty());
    }

    #[test]
    fn settings_set_rebuilds_prompt_and_emits_events() {
        let mut handler = HostHandler::new(AppContext::default());
        let resp = handler.handle(&cmd(
            CommandName::SettingsSet,
            serde_json::json!({
                "language": "French",
                "speech_rate": 1.2,
                "voice_style": "dramatic",
            }),
        ));
        assert!(resp.ok);
        assert_eq!(
            resp.payload["system_prompt"],
            build_prompt("French", 1.2, VoiceStyle::Dramatic)
        );

        let events = handler.drain_events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.event == "settings.changed"));
    }

    #[test]
    fn manual_prompt_in_same_patch_wins() {
        let mut handler = HostHandler::new(AppContext::default());
        handler.handle(&cmd(
            CommandName::SettingsSet,
            serde_json::json!({"language": "French", "system_prompt": "manual"}),
        ));
        assert_eq!(handler.context().settings.state().system_prompt, "manual");
    }

    #[test]
    fn prompt_preview_does_not_mutate() {
        let mut handler = HostHandler::new(AppContext::default());
        let before = handler.context().settings.snapshot();
        let resp = handler.handle(&cmd(
            CommandName::SettingsPromptPreview,
            serde_json::json!({"language": "Korean", "speech_rate": 0.5}),
        ));
        assert!(resp.ok);
        assert!(
            resp.payload["system_prompt"]
                .as_str()
                .unwrap()
                .contains("Slower than normal (0.5x)")
        );
        assert_eq!(*handler.context().settings.snapshot(), *before);
        assert!(handler.drain_events().is_empty());
    }

    #[test]
    fn rejected_rename_emits_no_event() {
        let mut handler = HostHandler::new(AppContext::default());
        handler.handle(&cmd(CommandName::ToolsAdd, serde_json::Value::Null));
        handler.handle(&cmd(CommandName::ToolsAdd, serde_json::Value::Null));
        handler.drain_events();

        let resp = handler.handle(&cmd(
            CommandName::ToolsUpdate,
            serde_json::json!({"old_name": "new_function", "tool": {"name": "new_function_1"}}),
        ));

        assert!(resp.ok);
        assert!(handler.drain_events().is_empty());
        let names: Vec<&str> = handler
            .context()
            .tools
            .state()
            .tools
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["new_function", "new_function_1"]);
    }

    #[test]
    fn turn_commands_flow_through_the_log() {
        let mut handler = HostHandler::new(AppContext::default());
        handler.handle(&cmd(
            CommandName::TurnsAdd,
            serde_json::json!({"role": "user", "text": "hi"}),
        ));
        handler.handle(&cmd(
            CommandName::TurnsUpdateLast,
            serde_json::json!({"is_final": true, "translation": "salut"}),
        ));

        let turn = handler.context().turns.last_turn().unwrap();
        assert!(turn.is_final);
        assert_eq!(turn.translation.as_deref(), Some("salut"));

        let events = handler.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].payload[0]["translation"], "salut");
    }

    #[test]
    fn live_tool_call_survives_turn_commands() {
        let mut handler = HostHandler::new(AppContext::default());
        let call = serde_json::json!({
            "functionCalls": [{"id": "c1", "name": "lookup", "args": {"q": "x"}}]
        });
        let resp = handler.handle(&cmd(
            CommandName::TurnsAdd,
            serde_json::json!({
                "id": "t1",
                "role": "system",
                "text": "",
                "tool_use_request": call,
            }),
        ));
        assert!(resp.ok);

        let reply = serde_json::json!({"functionResponses": [{"id": "c1", "response": {}}]});
        let resp = handler.handle(&cmd(
            CommandName::TurnsUpdate,
            serde_json::json!({"id": "t1", "update": {"tool_use_response": reply}}),
        ));
        assert!(resp.ok);

        let turn = handler.context().turns.last_turn().unwrap();
        assert_eq!(turn.tool_use_request.as_ref(), Some(&call));
        assert_eq!(turn.tool_use_response.as_ref(), Some(&reply));
    }

    #[test]
    fn bad_payload_is_an_error_response() {
        let mut handler = HostHandler::new(AppContext::default());
        let resp = handler.handle(&cmd(CommandName::ToolsToggle, serde_json::json!({"nom": 1})));
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("tools.toggle"));
    }

    #[test]
    fn wrong_version_is_rejected_before_routing() {
        let mut handler = HostHandler::new(AppContext::default());
        let mut envelope = cmd(CommandName::UiToggleTheme, serde_json::Value::Null);
        envelope.v = 99;
        let resp = handler.handle(&envelope);
        assert!(!resp.ok);
        assert!(handler.drain_events().is_empty());
    }
}
