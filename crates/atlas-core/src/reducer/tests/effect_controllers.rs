use pretty_assertions::assert_eq;

use super::*;

#[test]
fn highlight_directive_marks_resolved_targets() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m1",
            highlight_directive(&["quakes"], "red"),
        )),
    );

    assert_eq!(highlighted_ids(&state), vec!["quake-panel".to_string()]);
}

#[test]
fn newer_highlight_replaces_the_previous_one() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m1",
            highlight_directive(&["city-board"], "red"),
        )),
    );
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(ChatMessage::user("and now the quakes").with_id("m2")),
    );
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m3",
            highlight_directive(&["quake-panel"], "blue"),
        )),
    );

    assert_eq!(highlighted_ids(&state), vec!["quake-panel".to_string()]);
}

#[test]
fn clear_mode_returns_the_document_to_unmarked() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m1",
            highlight_directive(&["city-board"], "green"),
        )),
    );
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(ChatMessage::user("stop").with_id("m2")),
    );
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m3",
            Directive::new("HighlightOverlay").with("mode", serde_json::json!("clear")),
        )),
    );

    assert!(highlighted_ids(&state).is_empty());
    assert!(!state.highlight.is_active());
}

#[test]
fn scope_directive_filters_the_board() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m1", scope_directive("highest_aqi"))),
    );

    assert_eq!(
        visible_ids(&state, TargetCategory::City),
        vec!["city-delhi".to_string()]
    );
}

#[test]
fn feed_refresh_preserves_active_scope_and_highlight() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m1", scope_directive("highest_risk"))),
    );
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m2",
            highlight_directive(&["kpi-top-risk"], "yellow"),
        )),
    );

    // New snapshot rebuilds the dynamic rows.
    let mut next = snapshot();
    next.updated_ms = 2;
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(next));

    assert_eq!(
        visible_ids(&state, TargetCategory::City),
        vec!["city-delhi".to_string()]
    );
    assert_eq!(highlighted_ids(&state), vec!["kpi-top-risk".to_string()]);
}

#[test]
fn removing_the_scope_entry_restores_full_visibility() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    let scoped =
        directive_message("m1", scope_directive("quakes_only").with("id", serde_json::json!("s1")));
    run_runtime(&mut state, RuntimeAction::AppendMessage(scoped));
    assert!(visible_ids(&state, TargetCategory::City).is_empty());

    let mut eraser = ChatMessage::assistant("back to normal").with_id("m2");
    eraser.removed_component_ids.push("s1".to_string());
    run_runtime(&mut state, RuntimeAction::AppendMessage(eraser));

    assert_eq!(visible_ids(&state, TargetCategory::City).len(), 3);
}

#[test]
fn unknown_target_tokens_fall_back_without_failing() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m1",
            highlight_directive(&["atlantis"], "red"),
        )),
    );

    // Nothing resolved: the major sections light up instead.
    assert_eq!(highlighted_ids(&state), state.doc.major_sections());
}
