//! Scope effect controller.
//!
//! Unlike highlighting, scope holds no state of its own: every directive
//! starts from a full reset-to-visible and then hides whatever falls outside
//! the requested subset. The document model's visible flags are the only
//! record, so re-applying the latest directive after a rebuild reproduces the
//! same view.

use crate::message::Directive;
use crate::targets::DocumentModel;
use crate::targets::RankMetric;
use crate::targets::TargetCategory;
use crate::targets::CITY_PANEL_ID;
use crate::targets::QUAKE_PANEL_ID;

pub const TOP_N_DEFAULT: usize = 3;
pub const TOP_N_MAX: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeMode {
    All,
    City(String),
    CitiesOnly,
    QuakesOnly,
    Top {
        category: TargetCategory,
        metric: RankMetric,
        limit: usize,
    },
}

impl ScopeMode {
    /// Parse a scope directive. The single-winner modes are top-1 special
    /// cases; unknown modes read as `All` so a garbled directive degrades to
    /// the unfiltered board.
    pub fn from_directive(directive: &Directive) -> Self {
        let limit = directive
            .prop_f64("limit")
            .map(|n| (n as i64).clamp(1, TOP_N_MAX as i64) as usize)
            .unwrap_or(TOP_N_DEFAULT);

        let mode = directive
            .prop_str("mode")
            .map(str::trim)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match mode.as_str() {
            "city" => match directive.prop_str("cityId") {
                Some(id) if !id.trim().is_empty() => Self::City(id.trim().to_string()),
                _ => Self::All,
            },
            "cities_only" => Self::CitiesOnly,
            "quakes_only" => Self::QuakesOnly,
            "highest_aqi" => Self::top(TargetCategory::City, RankMetric::Aqi, 1),
            "highest_risk" => Self::top(TargetCategory::City, RankMetric::Risk, 1),
            "strongest_quake" => Self::top(TargetCategory::Quake, RankMetric::Magnitude, 1),
            "top_n_aqi" => Self::top(TargetCategory::City, RankMetric::Aqi, limit),
            "top_n_risk" => Self::top(TargetCategory::City, RankMetric::Risk, limit),
            "top_n_quakes" => Self::top(TargetCategory::Quake, RankMetric::Magnitude, limit),
            _ => Self::All,
        }
    }

    fn top(category: TargetCategory, metric: RankMetric, limit: usize) -> Self {
        Self::Top {
            category,
            metric,
            limit,
        }
    }
}

/// Reset every node to visible, then hide whatever the mode excludes.
pub fn apply_scope(mode: &ScopeMode, doc: &mut DocumentModel) {
    doc.reset_visibility();

    match mode {
        ScopeMode::All => {}
        ScopeMode::City(city_id) => {
            let keep = doc
                .resolve_id(city_id)
                .or_else(|| doc.resolve_id(&format!("city-{city_id}")));
            restrict_category(doc, TargetCategory::City, |id| Some(id) == keep.as_deref());
            hide_category(doc, TargetCategory::Quake);
            doc.set_visible(QUAKE_PANEL_ID, false);
        }
        ScopeMode::CitiesOnly => {
            hide_category(doc, TargetCategory::Quake);
            doc.set_visible(QUAKE_PANEL_ID, false);
        }
        ScopeMode::QuakesOnly => {
            hide_category(doc, TargetCategory::City);
            doc.set_visible(CITY_PANEL_ID, false);
        }
        ScopeMode::Top {
            category,
            metric,
            limit,
        } => {
            let keep = rank_top(doc, *category, *metric, *limit);
            restrict_category(doc, *category, |id| keep.iter().any(|k| k == id));
            let (other, panel) = match category {
                TargetCategory::City => (TargetCategory::Quake, QUAKE_PANEL_ID),
                TargetCategory::Quake => (TargetCategory::City, CITY_PANEL_ID),
            };
            hide_category(doc, other);
            doc.set_visible(panel, false);
        }
    }
}

/// Top-`limit` ids of a category by metric, descending; nodes without a
/// numeric value are excluded, ties keep document order.
fn rank_top(
    doc: &DocumentModel,
    category: TargetCategory,
    metric: RankMetric,
    limit: usize,
) -> Vec<String> {
    let mut ranked: Vec<(usize, f64, String)> = doc
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.category == Some(category))
        .filter_map(|(idx, node)| {
            node.metric(metric).map(|value| (idx, value, node.id.clone()))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, _, id)| id)
        .collect()
}

fn restrict_category(
    doc: &mut DocumentModel,
    category: TargetCategory,
    keep: impl Fn(&str) -> bool,
) {
    let hide: Vec<String> = doc
        .nodes()
        .iter()
        .filter(|node| node.category == Some(category) && !keep(&node.id))
        .map(|node| node.id.clone())
        .collect();
    for id in hide {
        doc.set_visible(&id, false);
    }
}

fn hide_category(doc: &mut DocumentModel, category: TargetCategory) {
    let hide: Vec<String> = doc
        .nodes()
        .iter()
        .filter(|node| node.category == Some(category))
        .map(|node| node.id.clone())
        .collect();
    for id in hide {
        doc.set_visible(&id, false);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::message::Directive;
    use crate::targets::TargetNode;

    fn scope(mode: &str) -> Directive {
        Directive::new("ScopeView").with("mode", json!(mode))
    }

    fn city(id: &str, aqi: Option<f64>, risk: f64) -> TargetNode {
        TargetNode {
            id: format!("city-{id}"),
            data_id: Some(id.to_string()),
            target: true,
            category: Some(TargetCategory::City),
            aqi,
            risk: Some(risk),
            magnitude: None,
            visible: true,
            highlight: None,
        }
    }

    fn quake(id: &str, magnitude: f64) -> TargetNode {
        TargetNode {
            id: format!("quake-{id}"),
            data_id: Some(id.to_string()),
            target: false,
            category: Some(TargetCategory::Quake),
            aqi: None,
            risk: None,
            magnitude: Some(magnitude),
            visible: true,
            highlight: None,
        }
    }

    fn board() -> DocumentModel {
        let mut doc = DocumentModel::with_static_sections();
        doc.push(city("sf", Some(40.0), 30.0));
        doc.push(city("delhi", Some(160.0), 70.0));
        doc.push(city("tokyo", Some(55.0), 45.0));
        doc.push(city("nodata", None, 20.0));
        doc.push(quake("q1", 4.4));
        doc.push(quake("q2", 6.1));
        doc
    }

    fn visible_cities(doc: &DocumentModel) -> Vec<String> {
        doc.visible_in_category(TargetCategory::City)
            .iter()
            .map(|node| node.id.clone())
            .collect()
    }

    #[test]
    fn highest_aqi_keeps_one_city_and_hides_quake_panel() {
        let mut doc = board();
        apply_scope(&ScopeMode::from_directive(&scope("highest_aqi")), &mut doc);

        assert_eq!(visible_cities(&doc), vec!["city-delhi".to_string()]);
        assert!(!doc.node(QUAKE_PANEL_ID).map(|n| n.visible).unwrap_or(true));
    }

    #[test]
    fn city_without_numeric_metric_is_never_ranked() {
        let mut doc = board();
        let directive = scope("top_n_aqi").with("limit", json!(10));
        apply_scope(&ScopeMode::from_directive(&directive), &mut doc);

        assert!(!visible_cities(&doc).contains(&"city-nodata".to_string()));
    }

    #[test]
    fn top_n_limit_is_clamped() {
        let top = ScopeMode::from_directive(&scope("top_n_risk").with("limit", json!(99)));
        assert_eq!(
            top,
            ScopeMode::Top {
                category: TargetCategory::City,
                metric: RankMetric::Risk,
                limit: TOP_N_MAX,
            }
        );

        let low = ScopeMode::from_directive(&scope("top_n_risk").with("limit", json!(0)));
        assert!(matches!(low, ScopeMode::Top { limit: 1, .. }));
    }

    #[test]
    fn each_application_starts_from_full_visibility() {
        let mut doc = board();
        apply_scope(&ScopeMode::from_directive(&scope("highest_aqi")), &mut doc);
        apply_scope(&ScopeMode::from_directive(&scope("all")), &mut doc);

        assert_eq!(visible_cities(&doc).len(), 4);
        assert!(doc.node(QUAKE_PANEL_ID).map(|n| n.visible).unwrap_or(false));
    }

    #[test]
    fn strongest_quake_keeps_only_the_max_magnitude_event() {
        let mut doc = board();
        apply_scope(&ScopeMode::from_directive(&scope("strongest_quake")), &mut doc);

        let quakes: Vec<String> = doc
            .visible_in_category(TargetCategory::Quake)
            .iter()
            .map(|node| node.id.clone())
            .collect();
        assert_eq!(quakes, vec!["quake-q2".to_string()]);
        assert!(!doc.node(CITY_PANEL_ID).map(|n| n.visible).unwrap_or(true));
    }

    #[test]
    fn city_mode_accepts_bare_and_prefixed_ids() {
        for token in ["tokyo", "city-tokyo"] {
            let mut doc = board();
            let directive = scope("city").with("cityId", json!(token));
            apply_scope(&ScopeMode::from_directive(&directive), &mut doc);
            assert_eq!(visible_cities(&doc), vec!["city-tokyo".to_string()]);
        }
    }

    #[test]
    fn unknown_mode_degrades_to_all() {
        assert_eq!(ScopeMode::from_directive(&scope("sideways")), ScopeMode::All);
    }
}
