use pretty_assertions::assert_eq;

use super::*;

#[test]
fn directive_messages_become_canvas_entries() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message(
            "m1",
            Directive::new("UIExplanationCard").with("title", serde_json::json!("Air quality")),
        )),
    );

    assert_eq!(state.canvas_entries.len(), 1);
    assert_eq!(state.canvas_entries[0].kind, ComponentKind::ExplanationCard);
}

#[test]
fn replayed_message_ids_do_not_duplicate_entries() {
    let mut state = state();
    let message = directive_message("m1", note_directive("n1", "check the wind"));
    run_runtime(&mut state, RuntimeAction::AppendMessage(message.clone()));
    run_runtime(&mut state, RuntimeAction::AppendMessage(message));

    assert_eq!(canvas_keys(&state), vec!["n1".to_string()]);
}

#[test]
fn fourth_sticky_note_evicts_the_oldest() {
    let mut state = state();
    for (i, text) in ["a", "b", "c", "d"].iter().enumerate() {
        run_runtime(
            &mut state,
            RuntimeAction::AppendMessage(directive_message(
                &format!("m{i}"),
                note_directive(&format!("n{i}"), text),
            )),
        );
    }

    assert_eq!(
        canvas_keys(&state),
        vec!["n1".to_string(), "n2".to_string(), "n3".to_string()]
    );
}

#[test]
fn dismissing_a_note_removes_it_from_every_future_derivation() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m1", note_directive("n1", "a"))),
    );
    reduce(
        &mut state,
        AtlasAction::User(UserAction::DismissNote("n1".to_string())),
    );
    assert!(canvas_keys(&state).is_empty());

    // A later unrelated change re-derives; the note stays gone.
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m2", note_directive("n2", "b"))),
    );
    assert_eq!(canvas_keys(&state), vec!["n2".to_string()]);
}

#[test]
fn replace_dispatch_clears_previous_local_entries() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::DispatchComponents {
            replace: false,
            directives: vec![note_directive("n1", "a")],
        },
    );
    run_runtime(
        &mut state,
        RuntimeAction::DispatchComponents {
            replace: true,
            directives: vec![note_directive("n2", "b")],
        },
    );

    assert_eq!(canvas_keys(&state), vec!["n2".to_string()]);
}

#[test]
fn append_dispatches_are_bounded() {
    let mut state = state();
    for i in 0..20 {
        run_runtime(
            &mut state,
            RuntimeAction::DispatchComponents {
                replace: false,
                directives: vec![note_directive(&format!("n{i}"), "x")],
            },
        );
    }

    assert_eq!(state.local.entries.len(), 12);
    // Reconciliation still bounds visible notes to three.
    assert_eq!(canvas_keys(&state).len(), 3);
}

#[test]
fn local_dispatch_wins_over_an_earlier_stream_entry() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m1", note_directive("n1", "stream"))),
    );
    run_runtime(
        &mut state,
        RuntimeAction::DispatchComponents {
            replace: false,
            directives: vec![note_directive("n1", "local")],
        },
    );

    assert_eq!(state.canvas_entries.len(), 1);
    assert_eq!(
        state.canvas_entries[0].directive.prop_str("text"),
        Some("local")
    );
}

#[test]
fn removal_signal_in_a_message_drops_the_entry() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m1", note_directive("n1", "a"))),
    );
    let mut eraser = ChatMessage::assistant("removed that note").with_id("m2");
    eraser.removed_component_ids.push("n1".to_string());
    run_runtime(&mut state, RuntimeAction::AppendMessage(eraser));

    assert!(canvas_keys(&state).is_empty());
}
