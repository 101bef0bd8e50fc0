//! The single reducer: every user keystroke and every runtime callback flows
//! through `reduce`, which mutates the state aggregate and returns the
//! effects the shell must perform. Runtime actions are pure state updates;
//! only user actions produce effects.

use super::actions::AtlasAction;
use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::actions::QUICK_PROMPTS;
use super::canvas::extract_entries;
use super::canvas::latest_of;
use super::canvas::local_entry;
use super::canvas::reconcile;
use super::canvas::LOCAL_ENTRY_CAP;
use super::intents::resolve_local_intent;
use super::message::normalize;
use super::message::ChatMessage;
use super::message::Directive;
use super::message::Role;
use super::registry::ComponentKind;
use super::scope::apply_scope;
use super::scope::ScopeMode;
use super::state::DashState;
use super::targets::TargetResolution;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::FeedStatus;
use super::state::UiTheme;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEnvelope {
    /// Replace clears previously dispatched local entries before appending;
    /// append keeps them.
    pub replace: bool,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtlasEffect {
    RequestFrame,
    SubmitChat {
        prompt: String,
        context: Option<String>,
    },
    PublishDispatch(DispatchEnvelope),
    CopyToClipboard(String),
}

pub fn reduce(state: &mut DashState, action: AtlasAction) -> Vec<AtlasEffect> {
    match action {
        AtlasAction::User(user) => reduce_user(state, user),
        AtlasAction::Runtime(runtime) => {
            reduce_runtime(state, runtime);
            Vec::new()
        }
    }
}

fn reduce_user(state: &mut DashState, action: UserAction) -> Vec<AtlasEffect> {
    match action {
        UserAction::ChatInput(c) => {
            state.chat.input.push(c);
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::ChatBackspace => {
            state.chat.input.pop();
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::ChatSubmit => submit_chat(state),
        UserAction::ChatHistoryUp => {
            if let Some(idx) = state.chat.history_index {
                if idx > 0 {
                    let new_idx = idx - 1;
                    state.chat.history_index = Some(new_idx);
                    state.chat.input = state.chat.history[new_idx].clone();
                }
            } else if !state.chat.history.is_empty() {
                let new_idx = state.chat.history.len() - 1;
                state.chat.history_index = Some(new_idx);
                state.chat.input = state.chat.history[new_idx].clone();
            }
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::ChatHistoryDown => {
            if let Some(idx) = state.chat.history_index {
                if idx < state.chat.history.len() - 1 {
                    let new_idx = idx + 1;
                    state.chat.history_index = Some(new_idx);
                    state.chat.input = state.chat.history[new_idx].clone();
                } else {
                    state.chat.history_index = None;
                    state.chat.input = String::new();
                }
            }
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::SetChatFocus(focus) => {
            state.chat.focus_in_chat = focus;
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::NextTab => {
            state.tab = state.tab.next();
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::PrevTab => {
            state.tab = state.tab.prev();
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::SelectTab(tab) => {
            state.tab = tab;
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::SetTheme(theme) => {
            state.theme = theme;
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::CycleTheme => {
            state.theme = state.theme.next();
            vec![AtlasEffect::RequestFrame]
        }
        UserAction::QuickPrompt(idx) => {
            let Some(item) = QUICK_PROMPTS.get(idx) else {
                return Vec::new();
            };
            state.chat.input = item.prompt.to_string();
            submit_chat(state)
        }
        UserAction::DismissNote(key) => {
            if !state.local.removed_ids.contains(&key) {
                state.local.removed_ids.push(key);
            }
            derive(state);
            vec![AtlasEffect::RequestFrame]
        }
    }
}

fn submit_chat(state: &mut DashState) -> Vec<AtlasEffect> {
    let input = std::mem::take(&mut state.chat.input);
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        return vec![AtlasEffect::RequestFrame];
    }

    state.chat.history.push(input.clone());
    state.chat.history_index = None;
    state.chat.submit_error = None;

    if trimmed.starts_with('/') {
        return run_slash_command(state, &trimmed);
    }

    // Local fast path: resolved intents never touch the assistant, so they
    // are allowed even while a request is in flight.
    if let Some(intent) = resolve_local_intent(&trimmed) {
        state.messages.push(ChatMessage::user(trimmed.clone()));
        meta_log(state, LogSource::Shell, format!("> {trimmed}"));
        state.messages.push(ChatMessage::assistant(intent.reply.clone()));
        meta_log(
            state,
            LogSource::Shell,
            format!("[assistant] {}", intent.reply),
        );
        derive(state);
        return vec![
            AtlasEffect::RequestFrame,
            AtlasEffect::PublishDispatch(DispatchEnvelope {
                replace: true,
                directives: intent.directives,
            }),
        ];
    }

    if state.chat.pending {
        // Keep the prompt in the input box so it is not lost.
        state.chat.input = input;
        state.chat.history.pop();
        state.chat.submit_error =
            Some("assistant is still answering the previous prompt".to_string());
        log(
            state,
            LogLevel::Warn,
            LogSource::Shell,
            "submission rejected: request already in flight".to_string(),
        );
        return vec![AtlasEffect::RequestFrame];
    }

    state.chat.pending = true;
    state.chat.live_preview.clear();
    state.messages.push(ChatMessage::user(trimmed.clone()));
    meta_log(state, LogSource::Shell, format!("> {trimmed}"));
    derive(state);
    let context = build_chat_context(state);
    vec![
        AtlasEffect::RequestFrame,
        AtlasEffect::SubmitChat {
            prompt: trimmed,
            context,
        },
    ]
}

fn run_slash_command(state: &mut DashState, input: &str) -> Vec<AtlasEffect> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument_tail = input
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or("");

    match command {
        "/h" | "/help" => {
            meta_log(
                state,
                LogSource::Shell,
                "[meta] Commands: /help, /status, /clear, /theme <name|next|prev>, /copylast, /focus"
                    .to_string(),
            );
        }
        "/status" => {
            let message = format!(
                "[meta] Status | tab:{} | theme:{} | feed:{} | cities:{} | quakes:{} | pending:{}",
                state.tab.label(),
                state.theme.label(),
                state.feed_status.label(),
                state.board.cities.len(),
                state.board.quakes.len(),
                if state.chat.pending { "yes" } else { "no" },
            );
            meta_log(state, LogSource::Shell, message);
        }
        "/clear" => {
            reduce_runtime(state, RuntimeAction::ClearLogs);
        }
        "/theme" => {
            if argument_tail.is_empty() {
                meta_log(
                    state,
                    LogSource::Shell,
                    "[meta] Usage: /theme <classic|cyberpunk|neon-noir|solar-flare|forest-zen|next|prev>"
                        .to_string(),
                );
            } else if argument_tail.eq_ignore_ascii_case("next") {
                state.theme = state.theme.next();
                let message = format!("[meta] Theme set to {}", state.theme.label());
                meta_log(state, LogSource::Shell, message);
            } else if argument_tail.eq_ignore_ascii_case("prev") {
                state.theme = state.theme.prev();
                let message = format!("[meta] Theme set to {}", state.theme.label());
                meta_log(state, LogSource::Shell, message);
            } else if let Some(theme) = UiTheme::parse(argument_tail) {
                state.theme = theme;
                let message = format!("[meta] Theme set to {}", theme.label());
                meta_log(state, LogSource::Shell, message);
            } else {
                let message = format!("[meta] Unknown theme '{argument_tail}'");
                meta_log(state, LogSource::Shell, message);
            }
        }
        "/copylast" => {
            if let Some(text) = latest_assistant_text(state) {
                meta_log(
                    state,
                    LogSource::Shell,
                    "[meta] Copied last assistant response to clipboard".to_string(),
                );
                return vec![
                    AtlasEffect::CopyToClipboard(text),
                    AtlasEffect::RequestFrame,
                ];
            }
            meta_log(
                state,
                LogSource::Shell,
                "[meta] No assistant response available to copy".to_string(),
            );
        }
        "/focus" => {
            state.chat.focus_in_chat = !state.chat.focus_in_chat;
            let message = format!(
                "[meta] Chat focus: {}",
                if state.chat.focus_in_chat { "on" } else { "off" }
            );
            meta_log(state, LogSource::Shell, message);
        }
        _ => {
            let message = format!("Unknown command: {input}");
            meta_log(state, LogSource::Shell, message);
        }
    }
    vec![AtlasEffect::RequestFrame]
}

fn reduce_runtime(state: &mut DashState, action: RuntimeAction) {
    match action {
        RuntimeAction::AppendMessage(message) => {
            if let Some(directive) = message.directive.as_ref() {
                report_directive_issues(state, directive);
            }
            state.messages.push(message);
            derive(state);
        }
        RuntimeAction::AssistantToken(text) => {
            state.chat.live_preview.push_str(&text);
        }
        RuntimeAction::AssistantMeta(message) => {
            meta_log(state, LogSource::Assistant, format!("[meta] {message}"));
        }
        RuntimeAction::AssistantDirective(directive) => {
            report_directive_issues(state, &directive);
            let message = format!("[meta] Directive: {}", directive.component_name);
            meta_log(state, LogSource::Assistant, message);
            state.chat.pending_directives.push(directive);
        }
        RuntimeAction::AssistantDone { error } => {
            state.chat.pending = false;
            let preview = std::mem::take(&mut state.chat.live_preview);
            let directives = std::mem::take(&mut state.chat.pending_directives);
            match error {
                Some(err) => {
                    state.chat.submit_error = Some(err.clone());
                    log(
                        state,
                        LogLevel::Error,
                        LogSource::Assistant,
                        format!("assistant request failed: {err}"),
                    );
                    if !directives.is_empty() {
                        log(
                            state,
                            LogLevel::Warn,
                            LogSource::Assistant,
                            format!(
                                "discarding {} directive(s) from the failed response",
                                directives.len()
                            ),
                        );
                    }
                }
                None => {
                    let text = preview.trim().to_string();
                    if !text.is_empty() {
                        meta_log(state, LogSource::Shell, format!("[assistant] {text}"));
                    }
                    // One completion, one assistant turn: the reply text and
                    // its first directive share a message.
                    let mut directives = directives.into_iter();
                    let mut first = ChatMessage::assistant(text);
                    if let Some(directive) = directives.next() {
                        first = first.with_directive(directive);
                    }
                    if !first.text().is_empty() || first.directive.is_some() {
                        state.messages.push(first);
                    }
                    for directive in directives {
                        state
                            .messages
                            .push(ChatMessage::assistant("").with_directive(directive));
                    }
                }
            }
            derive(state);
        }
        RuntimeAction::SetBoardSnapshot(snapshot) => {
            let message = format!(
                "snapshot: {} cities, {} quakes",
                snapshot.cities.len(),
                snapshot.quakes.len()
            );
            log(state, LogLevel::Debug, LogSource::Feed, message);
            state.board = snapshot;
            state.feed_status = FeedStatus::Live;
            state.doc.rebuild_from_snapshot(&state.board);
            apply_scope(&state.scope.clone(), &mut state.doc);
            state.highlight.reapply(&mut state.doc);
        }
        RuntimeAction::FeedFailed(err) => {
            state.feed_status = FeedStatus::Failed;
            log(
                state,
                LogLevel::Warn,
                LogSource::Feed,
                format!("feed refresh failed: {err}"),
            );
        }
        RuntimeAction::DispatchComponents {
            replace,
            directives,
        } => {
            for directive in &directives {
                report_directive_issues(state, directive);
            }
            if replace {
                state.local.entries.clear();
            }
            let seq = state.local.next_seq;
            state.local.next_seq += 1;
            for (idx, directive) in directives.iter().enumerate() {
                if let Some(entry) = local_entry(directive, seq, idx) {
                    state.local.entries.push(entry);
                }
            }
            while state.local.entries.len() > LOCAL_ENTRY_CAP {
                state.local.entries.remove(0);
            }
            derive(state);
        }
        RuntimeAction::AppendLog {
            level,
            source,
            message,
        } => {
            log(state, level, source, message);
        }
        RuntimeAction::ClearLogs => {
            state.logs.clear();
        }
    }
}

/// Re-run the whole derivation chain: normalize the stream, extract and
/// reconcile canvas entries, then re-apply the active side effects to the
/// document model. Safe to call after any input change.
fn derive(state: &mut DashState) {
    state.normalized = normalize(&state.messages);
    let extract = extract_entries(&state.normalized);

    let mut removed = extract.removed_ids;
    for id in &state.local.removed_ids {
        if !removed.contains(id) {
            removed.push(id.clone());
        }
    }

    state.canvas_entries = reconcile(&extract.entries, &state.local.entries, &removed);

    state.scope = latest_of(&state.canvas_entries, ComponentKind::ScopeView)
        .map(|entry| ScopeMode::from_directive(&entry.directive))
        .unwrap_or(ScopeMode::All);
    apply_scope(&state.scope.clone(), &mut state.doc);

    match latest_of(&state.canvas_entries, ComponentKind::HighlightOverlay) {
        Some(entry) => {
            let directive = entry.directive.clone();
            state.highlight.apply(&directive, &mut state.doc);
        }
        None => state.highlight.undo(&mut state.doc),
    }
}

/// Record a Warn entry for every problem in an incoming directive that the
/// controllers will otherwise paper over: an unknown component name, a
/// highlight target that resolves to nothing, a note anchor that resolves to
/// nothing. Runs once per arrival, not per derivation.
fn report_directive_issues(state: &mut DashState, directive: &Directive) {
    let mut issues: Vec<String> = Vec::new();
    match ComponentKind::parse(&directive.component_name) {
        None => issues.push(format!(
            "skipping unknown component '{}'",
            directive.component_name
        )),
        Some(ComponentKind::HighlightOverlay) => {
            for token in directive.prop_str_list("targetIds") {
                if state.doc.resolve(&token) == TargetResolution::NotFound {
                    issues.push(format!("highlight target '{token}' did not resolve"));
                }
            }
        }
        Some(ComponentKind::StickyNote) => {
            if let Some(anchor) = directive.prop_str("targetId") {
                if state.doc.resolve_id(anchor).is_none() {
                    issues.push(format!("note anchor '{anchor}' did not resolve"));
                }
            }
        }
        Some(_) => {}
    }
    for issue in issues {
        log(state, LogLevel::Warn, LogSource::App, issue);
    }
}

/// Compact board summary handed to the assistant with every prompt.
fn build_chat_context(state: &DashState) -> Option<String> {
    const MAX_CONTEXT_CHARS: usize = 8_000;

    let mut context = String::new();
    if let Some(city) = state.board.top_risk_city() {
        context.push_str(&format!(
            "Top risk city: {} (risk {}, {})\n",
            city.name,
            city.risk,
            city.risk_label.label()
        ));
    }
    if let Some(quake) = state.board.strongest_quake() {
        context.push_str(&format!(
            "Strongest quake: M{:.1} {}\n",
            quake.magnitude, quake.place
        ));
    }
    for city in &state.board.cities {
        let line = format!(
            "{}: aqi {}, risk {} ({})\n",
            city.name,
            city.aqi.map(|v| v.round().to_string()).unwrap_or_else(|| "n/a".to_string()),
            city.risk,
            city.risk_label.label()
        );
        if context.len() + line.len() > MAX_CONTEXT_CHARS {
            context.push_str("... (truncated)\n");
            break;
        }
        context.push_str(&line);
    }

    if context.is_empty() {
        None
    } else {
        Some(context)
    }
}

fn latest_assistant_text(state: &DashState) -> Option<String> {
    state
        .normalized
        .iter()
        .rev()
        .filter(|message| message.role == Role::Assistant)
        .map(ChatMessage::text)
        .find(|text| !text.is_empty())
}

fn meta_log(state: &mut DashState, source: LogSource, message: String) {
    log(state, LogLevel::Info, source, message);
}

fn log(state: &mut DashState, level: LogLevel, source: LogSource, message: String) {
    state.logs.append(LogEntry::new(level, source, message));
}

#[cfg(test)]
mod tests;
