use pretty_assertions::assert_eq;

use super::*;

#[test]
fn plain_prompt_locks_submission_and_emits_submit_chat() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    let effects = type_and_submit(&mut state, "why is delhi air so bad?");

    assert!(state.chat.pending);
    let submit = effects.iter().find_map(|effect| match effect {
        AtlasEffect::SubmitChat { prompt, context } => Some((prompt.clone(), context.clone())),
        _ => None,
    });
    let (prompt, context) = submit.expect("prompt goes to the assistant");
    assert_eq!(prompt, "why is delhi air so bad?");
    assert!(context.expect("board context attached").contains("Delhi"));
}

#[test]
fn second_submission_while_pending_is_rejected_and_input_is_kept() {
    let mut state = state();
    type_and_submit(&mut state, "first question");
    assert!(state.chat.pending);

    let effects = type_and_submit(&mut state, "second question");

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, AtlasEffect::SubmitChat { .. })));
    assert_eq!(state.chat.input, "second question");
    assert!(state.chat.submit_error.is_some());
}

#[test]
fn local_intent_skips_the_assistant_and_publishes_a_dispatch() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    let effects = type_and_submit(&mut state, "show me the strongest earthquake");

    assert!(!state.chat.pending);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, AtlasEffect::SubmitChat { .. })));
    let envelope = effects.iter().find_map(|effect| match effect {
        AtlasEffect::PublishDispatch(envelope) => Some(envelope.clone()),
        _ => None,
    });
    let envelope = envelope.expect("intent publishes directives");
    assert!(envelope.replace);
    // Scope filter plus a red flag on the quake panel, as one batch.
    assert_eq!(envelope.directives.len(), 2);
    assert_eq!(
        envelope.directives[0].prop_str("mode"),
        Some("strongest_quake")
    );
    assert_eq!(
        envelope.directives[1].prop_str_list("targetIds"),
        vec!["quake-panel".to_string()]
    );
    assert_eq!(envelope.directives[1].prop_str("color"), Some("red"));
    // A user turn and an acknowledgment both land in the transcript.
    assert_eq!(state.normalized.len(), 2);
}

#[test]
fn local_intents_are_allowed_while_a_request_is_pending() {
    let mut state = state();
    type_and_submit(&mut state, "first question");
    assert!(state.chat.pending);

    let effects = type_and_submit(&mut state, "unhighlight everything");

    assert!(effects
        .iter()
        .any(|effect| matches!(effect, AtlasEffect::PublishDispatch(_))));
    assert!(state.chat.pending);
}

#[test]
fn failed_response_clears_the_lock_and_allows_a_retry() {
    let mut state = state();
    type_and_submit(&mut state, "first question");
    run_runtime(
        &mut state,
        RuntimeAction::AssistantToken("partial...".to_string()),
    );
    run_runtime(
        &mut state,
        RuntimeAction::AssistantDone {
            error: Some("connection reset".to_string()),
        },
    );

    assert!(!state.chat.pending);
    assert_eq!(state.chat.submit_error.as_deref(), Some("connection reset"));
    assert!(state.chat.live_preview.is_empty());
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.level == LogLevel::Error));

    let effects = type_and_submit(&mut state, "try again");
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, AtlasEffect::SubmitChat { .. })));
}

#[test]
fn successful_response_flushes_the_streamed_preview() {
    let mut state = state();
    type_and_submit(&mut state, "tell me about tokyo");
    run_runtime(&mut state, RuntimeAction::AssistantToken("Tokyo is ".to_string()));
    run_runtime(&mut state, RuntimeAction::AssistantToken("calm today.".to_string()));
    run_runtime(&mut state, RuntimeAction::AssistantDone { error: None });

    assert!(!state.chat.pending);
    let last = state.normalized.last().expect("assistant turn recorded");
    assert_eq!(last.text(), "Tokyo is calm today.");
}

#[test]
fn response_text_and_directive_land_in_one_assistant_turn() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    type_and_submit(&mut state, "pin a reminder about delhi");
    run_runtime(&mut state, RuntimeAction::AssistantToken("Pinned.".to_string()));
    run_runtime(
        &mut state,
        RuntimeAction::AssistantDirective(note_directive("n1", "watch delhi")),
    );
    run_runtime(&mut state, RuntimeAction::AssistantDone { error: None });

    let last = state.normalized.last().expect("assistant turn recorded");
    assert_eq!(last.text(), "Pinned.");
    assert!(last.directive.is_some());
    assert_eq!(canvas_keys(&state), vec!["n1".to_string()]);
}

#[test]
fn quick_prompt_submits_its_canned_text() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    let effects = reduce(&mut state, AtlasAction::User(UserAction::QuickPrompt(3)));

    // "Highlight the quake panel in red" resolves locally.
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, AtlasEffect::PublishDispatch(_))));
}

#[test]
fn slash_help_and_status_log_without_touching_the_stream() {
    let mut state = state();
    type_and_submit(&mut state, "/help");
    type_and_submit(&mut state, "/status");

    assert!(state.normalized.is_empty());
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.message.contains("/theme")));
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.message.contains("pending:no")));
}

#[test]
fn slash_theme_sets_cycles_and_rejects() {
    let mut state = state();
    type_and_submit(&mut state, "/theme cyberpunk");
    assert_eq!(state.theme, UiTheme::Cyberpunk);

    type_and_submit(&mut state, "/theme next");
    assert_eq!(state.theme, UiTheme::NeonNoir);

    type_and_submit(&mut state, "/theme prev");
    assert_eq!(state.theme, UiTheme::Cyberpunk);

    type_and_submit(&mut state, "/theme plaid");
    assert_eq!(state.theme, UiTheme::Cyberpunk);
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.message.contains("Unknown theme")));
}

#[test]
fn slash_copylast_copies_the_latest_assistant_text() {
    let mut state = state();
    type_and_submit(&mut state, "question");
    run_runtime(&mut state, RuntimeAction::AssistantToken("the answer".to_string()));
    run_runtime(&mut state, RuntimeAction::AssistantDone { error: None });

    let effects = type_and_submit(&mut state, "/copylast");
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, AtlasEffect::CopyToClipboard(text) if text == "the answer")));
}

#[test]
fn chat_history_recalls_previous_prompts() {
    let mut state = state();
    type_and_submit(&mut state, "unhighlight everything");
    type_and_submit(&mut state, "show everything");

    reduce(&mut state, AtlasAction::User(UserAction::ChatHistoryUp));
    assert_eq!(state.chat.input, "show everything");
    reduce(&mut state, AtlasAction::User(UserAction::ChatHistoryUp));
    assert_eq!(state.chat.input, "unhighlight everything");
    reduce(&mut state, AtlasAction::User(UserAction::ChatHistoryDown));
    reduce(&mut state, AtlasAction::User(UserAction::ChatHistoryDown));
    assert_eq!(state.chat.input, "");
}
