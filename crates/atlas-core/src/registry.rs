//! Registry of the known generative-UI components.
//!
//! Directive component names arrive as free strings from the assistant; they
//! are resolved into a tagged variant here, and unknown names fall out as
//! `None` so a batch can skip them without failing.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    ExplanationCard,
    RunbookCard,
    HighlightOverlay,
    ScopeView,
    StickyNote,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExplanationCard => "UIExplanationCard",
            Self::RunbookCard => "RunbookCard",
            Self::HighlightOverlay => "HighlightOverlay",
            Self::ScopeView => "ScopeView",
            Self::StickyNote => "StickyNote",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "UIExplanationCard" => Some(Self::ExplanationCard),
            "RunbookCard" => Some(Self::RunbookCard),
            "HighlightOverlay" => Some(Self::HighlightOverlay),
            "ScopeView" => Some(Self::ScopeView),
            "StickyNote" => Some(Self::StickyNote),
            _ => None,
        }
    }
}

/// How a reconciled entry reaches the screen: cards render in the canvas
/// column, side effects mutate the document model, pinned notes float as
/// overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSurface {
    CanvasCard,
    SideEffect,
    PinnedNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub description: &'static str,
    pub surface: RenderSurface,
    pub params: &'static [ParamSpec],
}

pub struct ComponentRegistry;

const COMPONENT_SPECS: [ComponentSpec; 5] = [
    ComponentSpec {
        kind: ComponentKind::ExplanationCard,
        description: "Structured explanatory card for summarizing live signals and observations.",
        surface: RenderSurface::CanvasCard,
        params: &[
            ParamSpec {
                name: "title",
                description: "Card heading.",
            },
            ParamSpec {
                name: "summary",
                description: "One-paragraph interpretation of the current data.",
            },
            ParamSpec {
                name: "bullets",
                description: "Supporting observations, one per line.",
            },
        ],
    },
    ComponentSpec {
        kind: ComponentKind::RunbookCard,
        description: "Operational runbook with concrete steps and ownership.",
        surface: RenderSurface::CanvasCard,
        params: &[
            ParamSpec {
                name: "title",
                description: "Runbook heading.",
            },
            ParamSpec {
                name: "objective",
                description: "What the runbook is trying to achieve.",
            },
            ParamSpec {
                name: "severity",
                description: "One of P1, P2, P3.",
            },
            ParamSpec {
                name: "steps",
                description: "Ordered steps: {step, owner, status todo|in_progress|done}.",
            },
        ],
    },
    ComponentSpec {
        kind: ComponentKind::HighlightOverlay,
        description: "Highlights one or more dashboard targets. Use mode 'clear' to remove all highlights.",
        surface: RenderSurface::SideEffect,
        params: &[
            ParamSpec {
                name: "targetIds",
                description: "Target tokens to resolve and mark.",
            },
            ParamSpec {
                name: "color",
                description: "One of red, green, blue, yellow.",
            },
            ParamSpec {
                name: "mode",
                description: "Supports set, clear, remove, unset, off, all.",
            },
        ],
    },
    ComponentSpec {
        kind: ComponentKind::ScopeView,
        description: "Filters the dashboard to the most relevant subset (for example only the highest AQI city).",
        surface: RenderSurface::SideEffect,
        params: &[
            ParamSpec {
                name: "mode",
                description: "all, city, highest_aqi, highest_risk, strongest_quake, quakes_only, \
                              cities_only, top_n_aqi, top_n_risk, top_n_quakes.",
            },
            ParamSpec {
                name: "cityId",
                description: "City id for mode 'city'.",
            },
            ParamSpec {
                name: "limit",
                description: "Result bound for top_n_* modes.",
            },
        ],
    },
    ComponentSpec {
        kind: ComponentKind::StickyNote,
        description: "Anchored note pinned to a target section or row in the live dashboard.",
        surface: RenderSurface::PinnedNote,
        params: &[
            ParamSpec {
                name: "id",
                description: "Stable note identity.",
            },
            ParamSpec {
                name: "text",
                description: "Note body.",
            },
            ParamSpec {
                name: "targetId",
                description: "Target id to anchor the note to.",
            },
            ParamSpec {
                name: "placement",
                description: "top-right, top-left, bottom-right, bottom-left, center.",
            },
            ParamSpec {
                name: "offsetX",
                description: "Horizontal cell offset from the computed anchor.",
            },
            ParamSpec {
                name: "offsetY",
                description: "Vertical cell offset from the computed anchor.",
            },
        ],
    },
];

impl ComponentRegistry {
    pub fn list() -> &'static [ComponentSpec] {
        &COMPONENT_SPECS
    }

    pub fn get(kind: ComponentKind) -> &'static ComponentSpec {
        match kind {
            ComponentKind::ExplanationCard => &COMPONENT_SPECS[0],
            ComponentKind::RunbookCard => &COMPONENT_SPECS[1],
            ComponentKind::HighlightOverlay => &COMPONENT_SPECS[2],
            ComponentKind::ScopeView => &COMPONENT_SPECS[3],
            ComponentKind::StickyNote => &COMPONENT_SPECS[4],
        }
    }

    /// Lookup by raw directive name. `None` means "skip this entry".
    pub fn lookup(name: &str) -> Option<&'static ComponentSpec> {
        ComponentKind::parse(name).map(Self::get)
    }
}
