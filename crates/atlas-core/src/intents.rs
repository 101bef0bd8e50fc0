//! Local intent resolver.
//!
//! Common operational phrasings are answered instantly, without a round trip
//! to the assistant. Rules are checked in priority order and the first match
//! wins, so negations ("unhighlight") are listed before their positive
//! counterparts. A matched intent yields the full batch of directives plus a
//! short acknowledgment line.

use regex::Captures;
use regex::Regex;
use serde_json::json;

use crate::message::Directive;
use crate::scope::TOP_N_MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct IntentMatch {
    pub reply: String,
    pub directives: Vec<Directive>,
}

type Handler = fn(&Captures, &str) -> IntentMatch;

/// Checked top to bottom; first hit wins.
const RULES: &[(&str, Handler)] = &[
    (
        r"(?i)\b(unhighlight|clear\s+(the\s+)?highlights?|remove\s+(the\s+)?highlights?|stop\s+highlighting)\b",
        clear_highlight,
    ),
    (
        r"(?i)\bhighlight\b.*\b(everything|all)\b|\b(everything|all)\b.*\bhighlight",
        highlight_all,
    ),
    (
        r"(?i)\b(show|focus\s+on)\b.*\bhighest\s+risk\b.*\bhighlight\b",
        focus_and_highlight_risk,
    ),
    (r"(?i)\bhighlight\s+(?P<target>[a-z0-9 -]+)", highlight_target),
    (
        r"(?i)\btop\s+(?P<n>\d+)\b.*\b(aqi|air)\b",
        |caps, _| top_n("top_n_aqi", caps, "AQI"),
    ),
    (
        r"(?i)\btop\s+(?P<n>\d+)\b.*\brisk",
        |caps, _| top_n("top_n_risk", caps, "risk"),
    ),
    (
        r"(?i)\btop\s+(?P<n>\d+)\b.*\b(quake|earthquake)",
        |caps, _| top_n("top_n_quakes", caps, "magnitude"),
    ),
    // Metric-less "top N cities" ranks by risk.
    (
        r"(?i)\btop\s+(?P<n>\d+)\s+cit(y|ies)\b",
        |caps, _| top_n("top_n_risk", caps, "risk"),
    ),
    (
        r"(?i)\b(highest|worst)\s+(aqi|air\s+quality)\b|\bmost\s+polluted\b",
        |_, _| scope_reply("highest_aqi", "Scoping to the city with the highest AQI."),
    ),
    (
        r"(?i)\b(highest|worst|most)\s+(at\s+)?risk\b|\briskiest\b",
        |_, _| scope_reply("highest_risk", "Scoping to the highest-risk city."),
    ),
    (
        r"(?i)\b(strongest|biggest|largest)\s+(quake|earthquake)\b",
        strongest_quake,
    ),
    (
        r"(?i)\b(only|just)\b.*\b(quakes?|earthquakes?)\b|\b(quakes?|earthquakes?)\s+only\b",
        |_, _| scope_reply("quakes_only", "Showing earthquakes only."),
    ),
    (
        r"(?i)\b(only|just)\b.*\bcit(y|ies)\b|\bcities\s+only\b",
        |_, _| scope_reply("cities_only", "Showing cities only."),
    ),
    (
        r"(?i)\b(show|bring\s+back)\s+(me\s+)?(everything|all|the\s+full\s+board)\b|\breset\s+(the\s+)?(view|board|scope)\b",
        |_, _| scope_reply("all", "Restoring the full board."),
    ),
    (
        r"(?i)\bfocus\s+on\s+(?P<city>[a-z][a-z -]*)",
        focus_city,
    ),
];

/// Resolve a prompt against the local rule table. `None` hands the prompt to
/// the assistant.
pub fn resolve_local_intent(prompt: &str) -> Option<IntentMatch> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return None;
    }
    for (pattern, handler) in RULES {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(prompt) {
            return Some(handler(&caps, prompt));
        }
    }
    None
}

fn color_in(prompt: &str) -> &'static str {
    for color in ["red", "green", "blue", "yellow"] {
        if prompt.to_ascii_lowercase().contains(color) {
            return color;
        }
    }
    "blue"
}

fn scope_reply(mode: &str, reply: &str) -> IntentMatch {
    IntentMatch {
        reply: reply.to_string(),
        directives: vec![Directive::new("ScopeView").with("mode", json!(mode))],
    }
}

fn clear_highlight(_: &Captures, _: &str) -> IntentMatch {
    IntentMatch {
        reply: "Cleared all highlights.".to_string(),
        directives: vec![Directive::new("HighlightOverlay").with("mode", json!("clear"))],
    }
}

fn highlight_all(_: &Captures, prompt: &str) -> IntentMatch {
    let color = color_in(prompt);
    IntentMatch {
        reply: format!("Highlighting every section in {color}."),
        directives: vec![
            Directive::new("HighlightOverlay")
                .with("mode", json!("all"))
                .with("color", json!(color)),
        ],
    }
}

fn highlight_target(caps: &Captures, prompt: &str) -> IntentMatch {
    let color = color_in(prompt);
    let raw = caps.name("target").map(|m| m.as_str()).unwrap_or_default();
    // Strip a trailing color word and filler so "the quake panel in red"
    // resolves as a target token.
    let target: String = raw
        .split_whitespace()
        .filter(|word| {
            !matches!(
                word.to_ascii_lowercase().as_str(),
                "the" | "in" | "with" | "panel" | "section" | "red" | "green" | "blue" | "yellow"
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    IntentMatch {
        reply: format!("Highlighting {} in {color}.", target.trim()),
        directives: vec![
            Directive::new("HighlightOverlay")
                .with("targetIds", json!([target.trim()]))
                .with("color", json!(color)),
        ],
    }
}

fn strongest_quake(_: &Captures, _: &str) -> IntentMatch {
    IntentMatch {
        reply: "Scoping to the strongest earthquake.".to_string(),
        directives: vec![
            Directive::new("ScopeView").with("mode", json!("strongest_quake")),
            Directive::new("HighlightOverlay")
                .with("targetIds", json!(["quake-panel"]))
                .with("color", json!("red")),
        ],
    }
}

fn focus_and_highlight_risk(_: &Captures, prompt: &str) -> IntentMatch {
    let color = color_in(prompt);
    IntentMatch {
        reply: "Scoping to the highest-risk city and highlighting it.".to_string(),
        directives: vec![
            Directive::new("ScopeView").with("mode", json!("highest_risk")),
            Directive::new("HighlightOverlay")
                .with("targetIds", json!(["kpi-top-risk", "city-board"]))
                .with("color", json!(color)),
        ],
    }
}

fn top_n(mode: &str, caps: &Captures, metric: &str) -> IntentMatch {
    let n = caps
        .name("n")
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(3)
        .clamp(1, TOP_N_MAX as i64);
    IntentMatch {
        reply: format!("Showing the top {n} by {metric}."),
        directives: vec![
            Directive::new("ScopeView")
                .with("mode", json!(mode))
                .with("limit", json!(n)),
        ],
    }
}

fn focus_city(caps: &Captures, _: &str) -> IntentMatch {
    let city = caps
        .name("city")
        .map(|m| m.as_str().trim())
        .unwrap_or_default()
        .to_ascii_lowercase();
    IntentMatch {
        reply: format!("Focusing on {city}."),
        directives: vec![
            Directive::new("ScopeView")
                .with("mode", json!("city"))
                .with("cityId", json!(city)),
        ],
    }
}
