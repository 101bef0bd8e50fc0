use pretty_assertions::assert_eq;

use super::*;

/// Feed every published dispatch back into the reducer, the way the shell's
/// event loop does.
fn pump(state: &mut DashState, effects: Vec<AtlasEffect>) {
    for effect in effects {
        if let AtlasEffect::PublishDispatch(DispatchEnvelope {
            replace,
            directives,
        }) = effect
        {
            run_runtime(
                state,
                RuntimeAction::DispatchComponents {
                    replace,
                    directives,
                },
            );
        }
    }
}

#[test]
fn strongest_quake_prompt_scopes_the_board_end_to_end() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    let effects = type_and_submit(&mut state, "show me the strongest earthquake");
    pump(&mut state, effects);

    assert_eq!(
        visible_ids(&state, TargetCategory::Quake),
        vec!["quake-q2".to_string()]
    );
    assert!(visible_ids(&state, TargetCategory::City).is_empty());
    assert_eq!(highlighted_ids(&state), vec!["quake-panel".to_string()]);
}

#[test]
fn highlight_everything_marks_all_targets_end_to_end() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    let effects = type_and_submit(&mut state, "highlight everything in green");
    pump(&mut state, effects);

    assert_eq!(highlighted_ids(&state).len(), state.doc.resolve_all().len());

    let effects = type_and_submit(&mut state, "unhighlight everything");
    pump(&mut state, effects);
    assert!(highlighted_ids(&state).is_empty());
}

#[test]
fn later_local_command_supersedes_the_earlier_one() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    let effects = type_and_submit(&mut state, "show only the cities");
    pump(&mut state, effects);
    assert!(visible_ids(&state, TargetCategory::Quake).is_empty());

    let effects = type_and_submit(&mut state, "top 2 cities by aqi");
    pump(&mut state, effects);

    assert_eq!(
        visible_ids(&state, TargetCategory::City),
        vec!["city-delhi".to_string(), "city-tokyo".to_string()]
    );
}

#[test]
fn assistant_directives_and_local_dispatches_share_one_canvas() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));

    // Assistant pins a note mid-stream.
    run_runtime(
        &mut state,
        RuntimeAction::AppendMessage(directive_message("m1", note_directive("n1", "watch delhi"))),
    );
    // User then scopes locally; the note must survive the dispatch.
    let effects = type_and_submit(&mut state, "worst air quality");
    pump(&mut state, effects);

    assert!(canvas_keys(&state).contains(&"n1".to_string()));
    assert_eq!(
        visible_ids(&state, TargetCategory::City),
        vec!["city-delhi".to_string()]
    );
}

#[test]
fn derivation_is_stable_across_repeated_snapshots() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(snapshot()));
    let effects = type_and_submit(&mut state, "top 2 cities by risk");
    pump(&mut state, effects);
    let before = visible_ids(&state, TargetCategory::City);

    for tick in 0..3 {
        let mut next = snapshot();
        next.updated_ms = 10 + tick;
        run_runtime(&mut state, RuntimeAction::SetBoardSnapshot(next));
    }

    assert_eq!(visible_ids(&state, TargetCategory::City), before);
}
