//! Addressable document model and target resolution.
//!
//! The dashboard is modeled as an ordered list of nodes. Static section nodes
//! are fixed; city/quake rows are rebuilt from every signal snapshot while
//! preserving the visible/highlight flags of surviving ids, so a feed refresh
//! cannot silently undo an active scope or highlight.

use crate::highlight::HighlightColor;
use crate::signal::BoardSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCategory {
    City,
    Quake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Aqi,
    Risk,
    Magnitude,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetNode {
    pub id: String,
    /// Secondary identifier matched when a token is not a literal id.
    pub data_id: Option<String>,
    /// Marks the node as a valid highlight/scope target.
    pub target: bool,
    pub category: Option<TargetCategory>,
    pub aqi: Option<f64>,
    pub risk: Option<f64>,
    pub magnitude: Option<f64>,
    pub visible: bool,
    pub highlight: Option<HighlightColor>,
}

impl TargetNode {
    pub fn section(id: &str) -> Self {
        Self {
            id: id.to_string(),
            data_id: None,
            target: true,
            category: None,
            aqi: None,
            risk: None,
            magnitude: None,
            visible: true,
            highlight: None,
        }
    }

    pub fn metric(&self, metric: RankMetric) -> Option<f64> {
        match metric {
            RankMetric::Aqi => self.aqi,
            RankMetric::Risk => self.risk,
            RankMetric::Magnitude => self.magnitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetResolution {
    All,
    Node(usize),
    NotFound,
}

pub const CITY_PANEL_ID: &str = "city-board";
pub const QUAKE_PANEL_ID: &str = "quake-panel";

/// Fallback set applied when a highlight request resolves to nothing.
pub const MAJOR_SECTION_IDS: &[&str] = &[
    "header-main",
    "kpi-top-risk",
    "kpi-quakes",
    "city-board",
    "quake-panel",
    "action-panel",
    "analysis-panel",
];

const STATIC_SECTION_IDS: &[&str] = &[
    "header-main",
    "kpi-top-risk",
    "kpi-quakes",
    "kpi-strongest-quake",
    "city-board",
    "quake-panel",
    "quake-top-event",
    "action-panel",
    "analysis-panel",
];

/// Domain synonyms checked before literal-id matching. The "all" alias is the
/// wildcard sentinel.
const TARGET_ALIASES: &[(&str, &str)] = &[
    ("header", "header-main"),
    ("main", "header-main"),
    ("major", "header-main"),
    ("city", "city-board"),
    ("cities", "city-board"),
    ("cityboard", "city-board"),
    ("board", "city-board"),
    ("quake", "quake-panel"),
    ("quakes", "quake-panel"),
    ("earthquake", "quake-panel"),
    ("earthquakes", "quake-panel"),
    ("actions", "action-panel"),
    ("action", "action-panel"),
    ("analysis", "analysis-panel"),
    ("risk", "kpi-top-risk"),
    ("all", "all"),
];

fn normalize_token(token: &str) -> String {
    token
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentModel {
    nodes: Vec<TargetNode>,
}

impl DocumentModel {
    pub fn with_static_sections() -> Self {
        Self {
            nodes: STATIC_SECTION_IDS.iter().map(|id| TargetNode::section(id)).collect(),
        }
    }

    pub fn nodes(&self) -> &[TargetNode] {
        &self.nodes
    }

    pub fn push(&mut self, node: TargetNode) {
        self.nodes.push(node);
    }

    pub fn node(&self, id: &str) -> Option<&TargetNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut TargetNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
        }
    }

    pub fn set_highlight(&mut self, id: &str, highlight: Option<HighlightColor>) {
        if let Some(node) = self.node_mut(id) {
            node.highlight = highlight;
        }
    }

    pub fn reset_visibility(&mut self) {
        for node in &mut self.nodes {
            node.visible = true;
        }
    }

    pub fn visible_in_category(&self, category: TargetCategory) -> Vec<&TargetNode> {
        self.nodes
            .iter()
            .filter(|node| node.category == Some(category) && node.visible)
            .collect()
    }

    /// Map a symbolic token to a node, the wildcard, or not-found. Callers
    /// skip not-found tokens instead of failing the whole request.
    pub fn resolve(&self, token: &str) -> TargetResolution {
        let normalized = normalize_token(token);
        if normalized.is_empty() {
            return TargetResolution::NotFound;
        }

        if let Some((_, alias)) = TARGET_ALIASES
            .iter()
            .find(|(key, _)| *key == normalized)
        {
            if *alias == "all" {
                return TargetResolution::All;
            }
            if let Some(idx) = self.nodes.iter().position(|node| node.id == *alias) {
                return TargetResolution::Node(idx);
            }
            return TargetResolution::NotFound;
        }

        let literal = token.trim();
        if let Some(idx) = self.nodes.iter().position(|node| node.id == literal) {
            return TargetResolution::Node(idx);
        }

        if let Some(idx) = self.nodes.iter().position(|node| {
            node.target && node.data_id.as_deref() == Some(literal)
        }) {
            return TargetResolution::Node(idx);
        }

        TargetResolution::NotFound
    }

    pub fn resolve_id(&self, token: &str) -> Option<String> {
        match self.resolve(token) {
            TargetResolution::Node(idx) => Some(self.nodes[idx].id.clone()),
            _ => None,
        }
    }

    /// Every node currently carrying the valid-target marker.
    pub fn resolve_all(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.target)
            .map(|node| node.id.clone())
            .collect()
    }

    /// Ids from the major-section fallback set that exist in this document.
    pub fn major_sections(&self) -> Vec<String> {
        MAJOR_SECTION_IDS
            .iter()
            .filter(|id| self.contains(id))
            .map(|id| id.to_string())
            .collect()
    }

    /// Rebuild dynamic city/quake rows from a snapshot. Static sections stay;
    /// visible/highlight flags of surviving dynamic ids are preserved.
    pub fn rebuild_from_snapshot(&mut self, snapshot: &BoardSnapshot) {
        let previous: Vec<TargetNode> = self
            .nodes
            .iter()
            .filter(|node| node.category.is_some())
            .cloned()
            .collect();
        self.nodes.retain(|node| node.category.is_none());

        for city in &snapshot.cities {
            let id = format!("city-{}", city.id);
            let prior = previous.iter().find(|node| node.id == id);
            self.nodes.push(TargetNode {
                data_id: Some(city.id.clone()),
                target: true,
                category: Some(TargetCategory::City),
                aqi: city.aqi,
                risk: Some(f64::from(city.risk)),
                magnitude: None,
                visible: prior.map(|node| node.visible).unwrap_or(true),
                highlight: prior.and_then(|node| node.highlight),
                id,
            });
        }

        for quake in &snapshot.quakes {
            let id = format!("quake-{}", quake.id);
            let prior = previous.iter().find(|node| node.id == id);
            self.nodes.push(TargetNode {
                data_id: Some(quake.id.clone()),
                target: false,
                category: Some(TargetCategory::Quake),
                aqi: None,
                risk: None,
                magnitude: Some(quake.magnitude),
                visible: prior.map(|node| node.visible).unwrap_or(true),
                highlight: prior.and_then(|node| node.highlight),
                id,
            });
        }
    }
}
