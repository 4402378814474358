//! Conversation transcript.
//!
//! Turns are appended in arrival order and stamped with the time they were
//! added. After that they only change through [`TurnLog::update_last_turn`]
//! and [`TurnLog::update_turn`], which shallow-merge a [`TurnUpdate`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Store, Subscription};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    System,
}

/// Web citation attached to a grounding chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Citation reference attached to an agent turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Live API tool-call message, kept exactly as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_request: Option<serde_json::Value>,
    /// Tool results sent back to the session, kept exactly as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

/// A turn as submitted by a producer, before it is timestamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTurn {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub source_text: Option<String>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub tool_use_request: Option<serde_json::Value>,
    #[serde(default)]
    pub tool_use_response: Option<serde_json::Value>,
    #[serde(default)]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

impl NewTurn {
    /// A non-final turn with only role and text set.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            text: text.into(),
            translation: None,
            source_text: None,
            is_final: false,
            speaker: None,
            tool_use_request: None,
            tool_use_response: None,
            grounding_chunks: None,
        }
    }

    fn stamp(self, timestamp: DateTime<Utc>) -> ConversationTurn {
        ConversationTurn {
            id: self.id,
            timestamp,
            role: self.role,
            text: self.text,
            translation: self.translation,
            source_text: self.source_text,
            is_final: self.is_final,
            speaker: self.speaker,
            tool_use_request: self.tool_use_request,
            tool_use_response: self.tool_use_response,
            grounding_chunks: self.grounding_chunks,
        }
    }
}

/// Partial update for a turn.
///
/// Only `Some` fields are applied; each replaces the whole field, nested
/// values included. The timestamp cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnUpdate {
    pub id: Option<String>,
    pub role: Option<Role>,
    pub text: Option<String>,
    pub translation: Option<String>,
    pub source_text: Option<String>,
    pub is_final: Option<bool>,
    pub speaker: Option<String>,
    pub tool_use_request: Option<serde_json::Value>,
    pub tool_use_response: Option<serde_json::Value>,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

impl TurnUpdate {
    /// Merge the set fields into `turn`.
    pub fn apply_to(&self, turn: &mut ConversationTurn) {
        if let Some(id) = &self.id {
            turn.id = Some(id.clone());
        }
        if let Some(role) = self.role {
            turn.role = role;
        }
        if let Some(text) = &self.text {
            turn.text.clone_from(text);
        }
        if let Some(translation) = &self.translation {
            turn.translation = Some(translation.clone());
        }
        if let Some(source_text) = &self.source_text {
            turn.source_text = Some(source_text.clone());
        }
        if let Some(is_final) = self.is_final {
            turn.is_final = is_final;
        }
        if let Some(speaker) = &self.speaker {
            turn.speaker = Some(speaker.clone());
        }
        if let Some(request) = &self.tool_use_request {
            turn.tool_use_request = Some(request.clone());
        }
        if let Some(response) = &self.tool_use_response {
            turn.tool_use_response = Some(response.clone());
        }
        if let Some(chunks) = &self.grounding_chunks {
            turn.grounding_chunks = Some(chunks.clone());
        }
    }
}

/// Observable, ordered transcript.
pub struct TurnLog {
    store: Store<Vec<ConversationTurn>>,
}

impl TurnLog {
    pub fn new() -> Self {
        Self {
            store: Store::new("turns", Vec::new()),
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.store.get()
    }

    pub fn snapshot(&self) -> Arc<Vec<ConversationTurn>> {
        self.store.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<ConversationTurn>, &Vec<ConversationTurn>) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn len(&self) -> usize {
        self.turns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns().is_empty()
    }

    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.turns().last()
    }

    /// Append `turn`, stamped with the current time.
    pub fn add_turn(&mut self, turn: NewTurn) {
        let turn = turn.stamp(Utc::now());
        tracing::debug!(role = ?turn.role, is_final = turn.is_final, "turn added");
        self.store.update(|current| {
            let mut next = current.clone();
            next.push(turn);
            Some(next)
        });
    }

    /// Merge `update` into the most recent turn. Does nothing when empty.
    pub fn update_last_turn(&mut self, update: TurnUpdate) {
        self.store.update(|current| {
            let mut next = current.clone();
            let last = next.last_mut()?;
            update.apply_to(last);
            tracing::trace!(is_final = last.is_final, "last turn updated");
            Some(next)
        });
    }

    /// Merge `update` into every turn whose id is `id`.
    ///
    /// Ids are not required to be unique; all matches are updated.
    pub fn update_turn(&mut self, id: &str, update: TurnUpdate) {
        self.store.update(|current| {
            if !current.iter().any(|t| t.id.as_deref() == Some(id)) {
                return None;
            }
            let mut next = current.clone();
            let mut updated = 0_usize;
            for turn in next.iter_mut().filter(|t| t.id.as_deref() == Some(id)) {
                update.apply_to(turn);
                updated += 1;
            }
            tracing::debug!(id, updated, "turns updated by id");
            Some(next)
        });
    }

    pub fn clear_turns(&mut self) {
        self.store.update(|current| {
            tracing::debug!(cleared = current.len(), "turns cleared");
            Some(Vec::new())
        });
    }
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn with_id(role: Role, text: &str, id: &str) -> NewTurn {
        NewTurn {
            id: Some(id.to_owned()),
            ..NewTurn::new(role, text)
        }
    }

    #[test]
    fn add_turn_stamps_and_appends_in_order() {
        let mut log = TurnLog::new();
        let before = Utc::now();
        log.add_turn(NewTurn::new(Role::User, "one"));
        log.add_turn(NewTurn::new(Role::Agent, "two"));
        let after = Utc::now();

        let texts: Vec<&str> = log.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        for turn in log.turns() {
            assert!(turn.timestamp >= before && turn.timestamp <= after);
        }
        assert!(log.turns()[0].timestamp <= log.turns()[1].timestamp);
    }

    #[test]
    fn update_last_turn_on_empty_log_is_silent() {
        let mut log = TurnLog::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let _sub = log.subscribe(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        log.update_last_turn(TurnUpdate {
            is_final: Some(true),
            ..TurnUpdate::default()
        });

        assert!(log.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn update_last_turn_merges_fields() {
        let mut log = TurnLog::new();
        log.add_turn(NewTurn::new(Role::User, "hi"));
        let stamped = log.turns()[0].timestamp;

        log.update_last_turn(TurnUpdate {
            is_final: Some(true),
            translation: Some("salut".to_owned()),
            ..TurnUpdate::default()
        });

        assert_eq!(log.len(), 1);
        let turn = log.last_turn().unwrap();
        assert_eq!(turn.text, "hi");
        assert!(turn.is_final);
        assert_eq!(turn.translation.as_deref(), Some("salut"));
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.timestamp, stamped);
    }

    #[test]
    fn update_last_turn_only_touches_the_last() {
        let mut log = TurnLog::new();
        log.add_turn(NewTurn::new(Role::User, "first"));
        log.add_turn(NewTurn::new(Role::Agent, "second"));
        log.update_last_turn(TurnUpdate {
            text: Some("second, revised".to_owned()),
            ..TurnUpdate::default()
        });
        assert_eq!(log.turns()[0].text, "first");
        assert_eq!(log.turns()[1].text, "second, revised");
    }

    #[test]
    fn update_turn_fans_out_to_every_matching_id() {
        let mut log = TurnLog::new();
        log.add_turn(with_id(Role::Agent, "a", "dup"));
        log.add_turn(with_id(Role::Agent, "b", "other"));
        log.add_turn(with_id(Role::Agent, "c", "dup"));

        log.update_turn(
            "dup",
            TurnUpdate {
                is_final: Some(true),
                ..TurnUpdate::default()
            },
        );

        let finals: Vec<bool> = log.turns().iter().map(|t| t.is_final).collect();
        assert_eq!(finals, vec![true, false, true]);
    }

    #[test]
    fn update_turn_without_match_is_silent() {
        let mut log = TurnLog::new();
        log.add_turn(NewTurn::new(Role::User, "no id"));
        let before = log.snapshot();
        log.update_turn(
            "missing",
            TurnUpdate {
                text: Some("x".to_owned()),
                ..TurnUpdate::default()
            },
        );
        assert_eq!(*log.snapshot(), *before);
    }

    #[test]
    fn nested_fields_are_replaced_not_merged() {
        let mut log = TurnLog::new();
        log.add_turn(NewTurn {
            grounding_chunks: Some(vec![GroundingChunk {
                web: Some(WebSource {
                    uri: Some("https://a.example".to_owned()),
                    title: Some("A".to_owned()),
                }),
            }]),
            ..NewTurn::new(Role::Agent, "cited")
        });
        log.update_last_turn(TurnUpdate {
            grounding_chunks: Some(vec![GroundingChunk {
                web: Some(WebSource {
                    uri: Some("https://b.example".to_owned()),
                    title: None,
                }),
            }]),
            ..TurnUpdate::default()
        });

        let chunks = log.last_turn().unwrap().grounding_chunks.clone().unwrap();
        assert_eq!(chunks.len(), 1);
        let web = chunks[0].web.clone().unwrap();
        assert_eq!(web.uri.as_deref(), Some("https://b.example"));
        assert!(web.title.is_none());
    }

    #[test]
    fn clear_turns_empties_the_log() {
        let mut log = TurnLog::new();
        for i in 0..5 {
            log.add_turn(NewTurn::new(Role::System, format!("event {i}")));
        }
        log.clear_turns();
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn new_turn_deserializes_from_minimal_json() {
        let turn: NewTurn = serde_json::from_str(r#"{"role":"user","text":"hi"}"#).unwrap();
        assert_eq!(turn, NewTurn::new(Role::User, "hi"));
    }

    #[test]
    fn live_tool_call_payloads_pass_through_unchanged() {
        let request = serde_json::json!({
            "functionCalls": [{"id": "c1", "name": "lookup", "args": {"q": "x"}}]
        });
        let response = serde_json::json!({
            "functionResponses": [{
                "id": "c1",
                "name": "lookup",
                "response": {"result": "ok", "scheduling": "WHEN_IDLE"}
            }]
        });

        let turn: NewTurn = serde_json::from_value(serde_json::json!({
            "role": "system",
            "text": "",
            "tool_use_request": request,
        }))
        .unwrap();
        let mut log = TurnLog::new();
        log.add_turn(turn);
        log.update_last_turn(TurnUpdate {
            tool_use_response: Some(response.clone()),
            ..TurnUpdate::default()
        });

        let json = serde_json::to_value(log.last_turn().unwrap()).unwrap();
        assert_eq!(json["tool_use_request"], request);
        assert_eq!(json["tool_use_response"], response);

        let back: ConversationTurn = serde_json::from_value(json).unwrap();
        assert_eq!(back, *log.last_turn().unwrap());
    }

    #[test]
    fn tool_call_without_name_is_accepted() {
        let update: TurnUpdate = serde_json::from_str(
            r#"{"tool_use_request":{"functionCalls":[{"id":"c2","args":{}}]}}"#,
        )
        .unwrap();
        let request = update.tool_use_request.unwrap();
        assert_eq!(request["functionCalls"][0]["id"], "c2");
    }
}
