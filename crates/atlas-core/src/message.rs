//! Chat message stream: the append-only log of user/assistant turns and the
//! normalization pass that collapses it into the canonical sequence the canvas
//! derives from.
//!
//! Messages are never mutated once appended. Duplicate delivery and leftover
//! streaming narration are both handled here, as a pure function, so every
//! downstream derivation can simply re-run.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Text,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    pub kind: PartKind,
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Text,
            text: Some(text.into()),
        }
    }
}

/// A named, parameterized UI action requested by the assistant or the local
/// intent resolver. Two directives are equal iff the component name and the
/// canonical JSON encoding of the props match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    #[serde(rename = "componentName")]
    pub component_name: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl Directive {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            props: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    pub fn signature(&self) -> String {
        format!(
            "{}:{}",
            self.component_name,
            canonical_json(&Value::Object(self.props.clone()))
        )
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(Value::as_f64)
    }

    pub fn prop_str_list(&self, key: &str) -> Vec<String> {
        self.props
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

/// Key-order-independent JSON encoding, used for directive equality and
/// structural keys.
pub fn canonical_json(value: &Value) -> String {
    fn write(value: &Value, out: &mut String) {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                out.push('{');
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&Value::String((*key).clone()).to_string());
                    out.push(':');
                    write(&map[*key], out);
                }
                out.push('}');
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write(item, out);
                }
                out.push(']');
            }
            other => out.push_str(&other.to_string()),
        }
    }

    let mut out = String::new();
    write(value, &mut out);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Option<String>,
    pub role: Role,
    pub parts: Vec<ContentPart>,
    pub directive: Option<Directive>,
    /// Component ids a later turn marked as removed from the canvas.
    #[serde(default)]
    pub removed_component_ids: Vec<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            parts: vec![ContentPart::text(text)],
            directive: None,
            removed_component_ids: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Assistant,
            parts: vec![ContentPart::text(text)],
            directive: None,
            removed_component_ids: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directive = Some(directive);
        self
    }

    /// Joined trimmed text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| part.kind == PartKind::Text)
            .filter_map(|part| part.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn directive_signature(&self) -> String {
        self.directive
            .as_ref()
            .map(Directive::signature)
            .unwrap_or_default()
    }

    /// Identity used for adjacent-duplicate collapsing: role + text +
    /// directive signature.
    fn structural_key(&self) -> String {
        let role = match self.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        format!("{}|{}|{}", role, self.text(), self.directive_signature())
    }
}

/// Collapse the append-only message log into its canonical ordered sequence.
///
/// Three passes: duplicate-id drop (first occurrence wins), adjacent
/// structural-duplicate collapse, and interim-text drop (a plain-text
/// assistant message next to a directive-bearing message is streaming
/// narration the directive superseded; directive messages and removal
/// signals always survive). The collapse/interim passes loop to a fixpoint
/// so the whole function is idempotent.
pub fn normalize(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut out: Vec<ChatMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        if let Some(id) = message.id.as_deref() {
            if !seen_ids.insert(id) {
                continue;
            }
        }
        out.push(message.clone());
    }

    loop {
        let before = out.len();
        out = collapse_adjacent(out);
        out = drop_interim_text(out);
        if out.len() == before {
            return out;
        }
    }
}

fn collapse_adjacent(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut out: Vec<ChatMessage> = Vec::with_capacity(messages.len());
    let mut last_key: Option<String> = None;
    for message in messages {
        let key = message.structural_key();
        if last_key.as_deref() == Some(key.as_str()) {
            continue;
        }
        last_key = Some(key);
        out.push(message);
    }
    out
}

fn drop_interim_text(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let carries_directive: Vec<bool> = messages
        .iter()
        .map(|message| message.directive.is_some())
        .collect();
    messages
        .into_iter()
        .enumerate()
        .filter(|(i, message)| {
            if message.role != Role::Assistant
                || message.directive.is_some()
                || !message.removed_component_ids.is_empty()
            {
                return true;
            }
            let prev = *i > 0 && carries_directive[i - 1];
            let next = carries_directive.get(i + 1).copied().unwrap_or(false);
            !(prev || next)
        })
        .map(|(_, message)| message)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn directive(name: &str, props: Value) -> Directive {
        let props = match props {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Directive {
            component_name: name.to_string(),
            props,
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        let messages = vec![
            ChatMessage::user("show risks"),
            ChatMessage::assistant("here").with_id("a1"),
            ChatMessage::assistant("here").with_id("a1"),
            ChatMessage::assistant("ok")
                .with_directive(directive("ScopeView", json!({"mode": "all"}))),
            ChatMessage::assistant("ok")
                .with_directive(directive("ScopeView", json!({"mode": "highest_aqi"}))),
            ChatMessage::assistant("ok")
                .with_directive(directive("ScopeView", json!({"mode": "strongest_quake"}))),
        ];

        let once = normalize(&messages);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let messages = vec![
            ChatMessage::assistant("first").with_id("m1"),
            ChatMessage::user("question").with_id("m2"),
            ChatMessage::assistant("changed text, same id").with_id("m1"),
        ];

        let normalized = normalize(&messages);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].text(), "first");
    }

    #[test]
    fn identical_adjacent_messages_without_ids_collapse() {
        let messages = vec![
            ChatMessage::assistant("same answer"),
            ChatMessage::assistant("same answer"),
        ];

        assert_eq!(normalize(&messages).len(), 1);
    }

    #[test]
    fn consecutive_directive_messages_all_survive() {
        let messages = vec![
            ChatMessage::assistant("a")
                .with_directive(directive("StickyNote", json!({"id": "n1"}))),
            ChatMessage::assistant("b")
                .with_directive(directive("StickyNote", json!({"id": "n2"}))),
            ChatMessage::assistant("c")
                .with_directive(directive("StickyNote", json!({"id": "n3"}))),
        ];

        assert_eq!(normalize(&messages).len(), 3);
    }

    #[test]
    fn interim_text_next_to_a_directive_is_dropped() {
        let messages = vec![
            ChatMessage::assistant("a")
                .with_directive(directive("ScopeView", json!({"mode": "all"}))),
            ChatMessage::assistant("streamed narration"),
            ChatMessage::assistant("c")
                .with_directive(directive("ScopeView", json!({"mode": "cities_only"}))),
        ];

        let normalized = normalize(&messages);
        let texts: Vec<String> = normalized.iter().map(ChatMessage::text).collect();
        assert_eq!(texts, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn assistant_text_away_from_directives_survives() {
        let messages = vec![
            ChatMessage::user("question"),
            ChatMessage::assistant("a plain answer"),
            ChatMessage::user("another question"),
            ChatMessage::assistant("ok")
                .with_directive(directive("ScopeView", json!({"mode": "all"}))),
        ];

        assert_eq!(normalize(&messages).len(), 4);
    }

    #[test]
    fn removal_signal_messages_survive_next_to_directives() {
        let mut eraser = ChatMessage::assistant("removed it");
        eraser.removed_component_ids.push("n1".to_string());
        let messages = vec![
            ChatMessage::assistant("a")
                .with_directive(directive("StickyNote", json!({"id": "n1"}))),
            eraser,
        ];

        let normalized = normalize(&messages);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[1].removed_component_ids, vec!["n1".to_string()]);
    }

    #[test]
    fn directive_equality_ignores_prop_order() {
        let a = directive("StickyNote", json!({"text": "hi", "targetId": "city-sf"}));
        let b = directive("StickyNote", json!({"targetId": "city-sf", "text": "hi"}));
        assert_eq!(a, b);
    }
}
