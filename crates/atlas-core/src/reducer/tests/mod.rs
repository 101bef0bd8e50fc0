use serde_json::json;

pub(super) use super::reduce;
pub(super) use super::AtlasEffect;
pub(super) use super::DispatchEnvelope;
pub(super) use crate::actions::AtlasAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::message::ChatMessage;
pub(super) use crate::message::Directive;
pub(super) use crate::registry::ComponentKind;
pub(super) use crate::signal::BoardSnapshot;
pub(super) use crate::signal::CityReading;
pub(super) use crate::signal::QuakeReading;
pub(super) use crate::signal::RiskLabel;
pub(super) use crate::state::DashState;
pub(super) use crate::state::LogEntry;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::LogSource;
pub(super) use crate::state::UiTheme;
pub(super) use crate::targets::TargetCategory;

mod canvas_reconcile;
mod effect_controllers;
mod scenarios;
mod submit_path;

fn state() -> DashState {
    DashState::new(UiTheme::Classic)
}

fn run_runtime(state: &mut DashState, action: RuntimeAction) {
    let effects = reduce(state, AtlasAction::Runtime(action));
    assert!(effects.is_empty());
}

fn type_and_submit(state: &mut DashState, prompt: &str) -> Vec<AtlasEffect> {
    for c in prompt.chars() {
        reduce(state, AtlasAction::User(UserAction::ChatInput(c)));
    }
    reduce(state, AtlasAction::User(UserAction::ChatSubmit))
}

fn city(id: &str, name: &str, aqi: f64, risk: u8) -> CityReading {
    CityReading {
        id: id.to_string(),
        name: name.into(),
        country: "XX".into(),
        temp_c: Some(20.0),
        wind_kph: Some(10.0),
        rain_mm: Some(0.0),
        aqi: Some(aqi),
        risk,
        risk_label: RiskLabel::for_score(risk),
    }
}

fn quake(id: &str, place: &str, magnitude: f64) -> QuakeReading {
    QuakeReading {
        id: id.to_string(),
        place: place.into(),
        magnitude,
        depth_km: 10.0,
        time_ms: 1,
    }
}

fn snapshot() -> BoardSnapshot {
    BoardSnapshot {
        cities: vec![
            city("sf", "San Francisco", 42.0, 31),
            city("delhi", "Delhi", 161.0, 72),
            city("tokyo", "Tokyo", 58.0, 44),
        ],
        quakes: vec![quake("q1", "Off the coast", 4.2), quake("q2", "Inland", 6.3)],
        updated_ms: 1,
    }
}

fn directive_message(id: &str, directive: Directive) -> ChatMessage {
    ChatMessage::assistant("").with_id(id).with_directive(directive)
}

fn scope_directive(mode: &str) -> Directive {
    Directive::new("ScopeView").with("mode", json!(mode))
}

fn highlight_directive(targets: &[&str], color: &str) -> Directive {
    Directive::new("HighlightOverlay")
        .with("targetIds", json!(targets))
        .with("color", json!(color))
}

fn note_directive(id: &str, text: &str) -> Directive {
    Directive::new("StickyNote")
        .with("id", json!(id))
        .with("text", json!(text))
        .with("targetId", json!("city-board"))
}

fn visible_ids(state: &DashState, category: TargetCategory) -> Vec<String> {
    state
        .doc
        .visible_in_category(category)
        .iter()
        .map(|node| node.id.clone())
        .collect()
}

fn highlighted_ids(state: &DashState) -> Vec<String> {
    state
        .doc
        .nodes()
        .iter()
        .filter(|node| node.highlight.is_some())
        .map(|node| node.id.clone())
        .collect()
}

fn canvas_keys(state: &DashState) -> Vec<String> {
    state
        .canvas_entries
        .iter()
        .map(|entry| entry.key.clone())
        .collect()
}
