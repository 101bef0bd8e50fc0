//! Highlight effect controller.
//!
//! One highlight set is active at a time. The controller records exactly which
//! node ids it marked so a later request (or clear) undoes only its own work,
//! never a flag someone else set.

use serde::Deserialize;
use serde::Serialize;

use crate::message::Directive;
use crate::targets::DocumentModel;
use crate::targets::TargetResolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl HighlightColor {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "yellow" => Some(Self::Yellow),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HighlightMode {
    Set,
    Clear,
    All,
}

fn parse_mode(raw: Option<&str>) -> HighlightMode {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("clear" | "remove" | "unset" | "off" | "none" | "reset") => HighlightMode::Clear,
        Some("all" | "everything") => HighlightMode::All,
        _ => HighlightMode::Set,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
enum HighlightState {
    #[default]
    Idle,
    Active {
        applied_ids: Vec<String>,
        color: HighlightColor,
    },
}

/// Applies and undoes highlight directives against the document model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightController {
    state: HighlightState,
}

impl HighlightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, HighlightState::Active { .. })
    }

    pub fn active_ids(&self) -> &[String] {
        match &self.state {
            HighlightState::Active { applied_ids, .. } => applied_ids,
            HighlightState::Idle => &[],
        }
    }

    pub fn active_color(&self) -> Option<HighlightColor> {
        match &self.state {
            HighlightState::Active { color, .. } => Some(*color),
            HighlightState::Idle => None,
        }
    }

    /// Undo the previously recorded set, then apply the directive. A clear
    /// request stops after the undo.
    pub fn apply(&mut self, directive: &Directive, doc: &mut DocumentModel) {
        self.undo(doc);

        let mode = parse_mode(directive.prop_str("mode"));
        if mode == HighlightMode::Clear {
            return;
        }

        let color = directive
            .prop_str("color")
            .and_then(HighlightColor::parse)
            .unwrap_or(HighlightColor::Yellow);

        let mut ids: Vec<String> = Vec::new();
        if mode == HighlightMode::All {
            ids = doc.resolve_all();
        } else {
            let mut wildcard = false;
            for token in directive.prop_str_list("targetIds") {
                match doc.resolve(&token) {
                    TargetResolution::All => {
                        wildcard = true;
                        break;
                    }
                    TargetResolution::Node(idx) => {
                        let id = doc.nodes()[idx].id.clone();
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    TargetResolution::NotFound => {}
                }
            }
            if wildcard {
                ids = doc.resolve_all();
            }
        }

        // Nothing usable resolved: fall back to the major sections rather
        // than silently doing nothing.
        if ids.is_empty() {
            ids = doc.major_sections();
        }
        if ids.is_empty() {
            return;
        }

        for id in &ids {
            doc.set_highlight(id, Some(color));
        }
        self.state = HighlightState::Active {
            applied_ids: ids,
            color,
        };
    }

    /// Remove every flag this controller set and return to idle.
    pub fn undo(&mut self, doc: &mut DocumentModel) {
        if let HighlightState::Active { applied_ids, .. } =
            std::mem::take(&mut self.state)
        {
            for id in &applied_ids {
                doc.set_highlight(id, None);
            }
        }
    }

    /// Re-apply the recorded set after the document was rebuilt without the
    /// flags (ids that no longer exist are dropped from the record).
    pub fn reapply(&mut self, doc: &mut DocumentModel) {
        if let HighlightState::Active { applied_ids, color } = &mut self.state {
            applied_ids.retain(|id| doc.contains(id));
            if applied_ids.is_empty() {
                self.state = HighlightState::Idle;
                return;
            }
            for id in applied_ids.iter() {
                doc.set_highlight(id, Some(*color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::message::Directive;

    fn highlight(targets: &[&str], color: &str) -> Directive {
        Directive::new("HighlightOverlay")
            .with("targetIds", json!(targets))
            .with("color", json!(color))
    }

    fn highlighted_ids(doc: &DocumentModel) -> Vec<String> {
        doc.nodes()
            .iter()
            .filter(|node| node.highlight.is_some())
            .map(|node| node.id.clone())
            .collect()
    }

    #[test]
    fn new_request_undoes_previous_set_first() {
        let mut doc = DocumentModel::with_static_sections();
        let mut ctl = HighlightController::new();

        ctl.apply(&highlight(&["city-board"], "red"), &mut doc);
        ctl.apply(&highlight(&["quake-panel"], "blue"), &mut doc);

        assert_eq!(highlighted_ids(&doc), vec!["quake-panel".to_string()]);
        assert_eq!(ctl.active_color(), Some(HighlightColor::Blue));
    }

    #[test]
    fn clear_synonyms_all_undo() {
        for mode in ["clear", "remove", "unset", "off", "none", "reset"] {
            let mut doc = DocumentModel::with_static_sections();
            let mut ctl = HighlightController::new();
            ctl.apply(&highlight(&["city-board"], "green"), &mut doc);
            ctl.apply(
                &Directive::new("HighlightOverlay").with("mode", json!(mode)),
                &mut doc,
            );
            assert!(highlighted_ids(&doc).is_empty(), "mode {mode}");
            assert!(!ctl.is_active());
        }
    }

    #[test]
    fn wildcard_token_marks_every_target() {
        let mut doc = DocumentModel::with_static_sections();
        let mut ctl = HighlightController::new();

        ctl.apply(&highlight(&["all"], "yellow"), &mut doc);

        assert_eq!(highlighted_ids(&doc).len(), doc.resolve_all().len());
    }

    #[test]
    fn unresolvable_targets_fall_back_to_major_sections() {
        let mut doc = DocumentModel::with_static_sections();
        let mut ctl = HighlightController::new();

        ctl.apply(&highlight(&["nonexistent", "bogus"], "red"), &mut doc);

        assert_eq!(highlighted_ids(&doc), doc.major_sections());
    }

    #[test]
    fn unknown_color_defaults_to_yellow() {
        let mut doc = DocumentModel::with_static_sections();
        let mut ctl = HighlightController::new();

        ctl.apply(&highlight(&["city-board"], "chartreuse"), &mut doc);

        assert_eq!(ctl.active_color(), Some(HighlightColor::Yellow));
    }

    #[test]
    fn reapply_restores_flags_after_rebuild_and_drops_dead_ids() {
        let mut doc = DocumentModel::with_static_sections();
        let mut ctl = HighlightController::new();
        ctl.apply(&highlight(&["city-board", "quake-panel"], "red"), &mut doc);

        // Simulate a rebuild that wiped flags.
        doc.set_highlight("city-board", None);
        doc.set_highlight("quake-panel", None);
        ctl.reapply(&mut doc);

        assert_eq!(
            highlighted_ids(&doc),
            vec!["city-board".to_string(), "quake-panel".to_string()]
        );
    }
}
