//! Assistant adapters: the deterministic simulated assistant and the
//! subprocess adapter speaking the JSON line protocol.
//!
//! Line protocol, one JSON object per stdout line:
//!   {"type":"message.delta","text":"..."}
//!   {"type":"ui.directive","componentName":"...","props":{...}}
//! Plain non-JSON lines are forwarded as tokens after ANSI stripping.

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::process::Command;
use std::process::Stdio;
use std::thread;

use serde_json::json;
use serde_json::Value;

use crate::contracts::DirectivePayload;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Token(String),
    Meta(String),
    Directive(DirectivePayload),
    Done { error: Option<String> },
}

pub trait ChatAdapter: Send {
    /// Stream one exchange. Implementations always finish with `Done`,
    /// carrying the error when the exchange failed.
    fn stream(&self, prompt: &str, context: Option<&str>, callback: &dyn Fn(ChatEvent));
}

fn build_prompt(model: Option<&str>, prompt: &str, context: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(
        "System:\n\
You are the Atlas hazard-board assistant. Answer about the live city and \
earthquake data. To drive the dashboard, emit ui.directive lines using the \
registered components.\n",
    );
    if let Some(model) = model {
        out.push_str("Runtime model: ");
        out.push_str(model);
        out.push('\n');
    }
    out.push('\n');
    if let Some(ctx) = context {
        out.push_str("Context:\n");
        out.push_str(ctx);
        out.push_str("\n\n");
    }
    out.push_str("User Request: ");
    out.push_str(prompt);
    out
}

fn strip_ansi_sequences(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            if chars.peek() == Some(&'[') {
                let _ = chars.next();
                for n in chars.by_ref() {
                    if ('@'..='~').contains(&n) {
                        break;
                    }
                }
                continue;
            }
            continue;
        }
        if c == '\r' {
            continue;
        }
        out.push(c);
    }
    out
}

/// Canned assistant for `--simulate`. Keyword-routed, fully deterministic,
/// and exercises every directive surface.
#[derive(Debug, Default)]
pub struct SimulatedAssistant;

impl SimulatedAssistant {
    pub fn new() -> Self {
        Self
    }
}

impl ChatAdapter for SimulatedAssistant {
    fn stream(&self, prompt: &str, context: Option<&str>, callback: &dyn Fn(ChatEvent)) {
        let lower = prompt.to_ascii_lowercase();

        if lower.contains("summar") {
            let summary = context
                .map(|ctx| ctx.lines().take(2).collect::<Vec<_>>().join(" "))
                .unwrap_or_else(|| "No live data is available yet.".to_string());
            for word in "Here is the current picture across the tracked cities.".split(' ') {
                callback(ChatEvent::Token(format!("{word} ")));
            }
            callback(ChatEvent::Directive(DirectivePayload {
                component_name: "UIExplanationCard".to_string(),
                props: props(json!({
                    "title": "Situation summary",
                    "summary": summary,
                    "bullets": "Watch the highest-risk city.\nQuake activity is within normal range.",
                })),
            }));
        } else if lower.contains("runbook") || lower.contains("what should") {
            callback(ChatEvent::Token("Drafting a response runbook.".to_string()));
            callback(ChatEvent::Directive(DirectivePayload {
                component_name: "RunbookCard".to_string(),
                props: props(json!({
                    "title": "Air quality response",
                    "objective": "Reduce exposure in the worst-affected city",
                    "severity": "P2",
                    "steps": [
                        {"step": "Confirm AQI trend over the last hour", "owner": "ops", "status": "todo"},
                        {"step": "Issue an advisory for outdoor activity", "owner": "comms", "status": "todo"},
                    ],
                })),
            }));
        } else if lower.contains("note") {
            callback(ChatEvent::Token("Pinned a note to the board.".to_string()));
            callback(ChatEvent::Directive(DirectivePayload {
                component_name: "StickyNote".to_string(),
                props: props(json!({
                    "id": "sim-note",
                    "text": "Revisit this board in an hour.",
                    "targetId": "city-board",
                })),
            }));
        } else {
            callback(ChatEvent::Meta("simulated assistant".to_string()));
            for word in
                "I can summarize the board, draft a runbook, highlight sections, or scope the view."
                    .split(' ')
            {
                callback(ChatEvent::Token(format!("{word} ")));
            }
        }
        callback(ChatEvent::Done { error: None });
    }
}

fn props(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// Spawns an external assistant command and parses its stdout line by line.
/// The assembled prompt is appended as the final argument.
pub struct CommandAssistant {
    program: String,
    args: Vec<String>,
    model: Option<String>,
}

impl CommandAssistant {
    pub fn from_command_line(command: &str, model: Option<String>) -> std::io::Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| std::io::Error::other("assistant command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
            model,
        })
    }

    fn dispatch_line(line: &str, callback: &dyn Fn(ChatEvent)) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if !trimmed.starts_with('{') {
            let plain = strip_ansi_sequences(trimmed);
            if !plain.is_empty() {
                callback(ChatEvent::Token(plain));
            }
            return;
        }
        let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
            callback(ChatEvent::Meta(trimmed.to_string()));
            return;
        };
        match value.get("type").and_then(Value::as_str) {
            Some("message.delta") => {
                if let Some(text) = value.get("text").and_then(Value::as_str) {
                    if !text.is_empty() {
                        callback(ChatEvent::Token(text.to_string()));
                    }
                }
            }
            Some("ui.directive") => {
                match serde_json::from_value::<DirectivePayload>(value.clone()) {
                    Ok(payload) => callback(ChatEvent::Directive(payload)),
                    Err(err) => {
                        callback(ChatEvent::Meta(format!("malformed directive: {err}")));
                    }
                }
            }
            Some(other) => callback(ChatEvent::Meta(format!("event: {other}"))),
            None => callback(ChatEvent::Meta(trimmed.to_string())),
        }
    }
}

impl ChatAdapter for CommandAssistant {
    fn stream(&self, prompt: &str, context: Option<&str>, callback: &dyn Fn(ChatEvent)) {
        let full_prompt = build_prompt(self.model.as_deref(), prompt, context);
        let spawn = Command::new(&self.program)
            .args(&self.args)
            .arg(full_prompt)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawn {
            Ok(child) => child,
            Err(err) => {
                callback(ChatEvent::Done {
                    error: Some(format!("failed to start assistant: {err}")),
                });
                return;
            }
        };

        let stderr_handle = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text);
                text
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            for line in reader.lines().map_while(Result::ok) {
                Self::dispatch_line(&line, callback);
            }
        }

        let status = child.wait().ok();
        let stderr_text = stderr_handle
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
            .trim()
            .to_string();

        if status.is_some_and(|s| s.success()) {
            callback(ChatEvent::Done { error: None });
        } else {
            let error = if stderr_text.is_empty() {
                "assistant exited with a non-zero status".to_string()
            } else {
                stderr_text
            };
            callback(ChatEvent::Done { error: Some(error) });
        }
    }
}
