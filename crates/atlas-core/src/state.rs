use std::collections::VecDeque;

use crate::canvas::CanvasEntry;
use crate::highlight::HighlightController;
use crate::message::ChatMessage;
use crate::message::Directive;
use crate::scope::ScopeMode;
use crate::signal::BoardSnapshot;
use crate::targets::DocumentModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashTab {
    Board,
    Chat,
    Logs,
}

impl DashTab {
    pub fn next(self) -> Self {
        match self {
            Self::Board => Self::Chat,
            Self::Chat => Self::Logs,
            Self::Logs => Self::Board,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Board => Self::Logs,
            Self::Chat => Self::Board,
            Self::Logs => Self::Chat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Board => "Board",
            Self::Chat => "Chat",
            Self::Logs => "Logs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiTheme {
    Classic,
    Cyberpunk,
    NeonNoir,
    SolarFlare,
    ForestZen,
}

impl UiTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Cyberpunk => "cyberpunk",
            Self::NeonNoir => "neon-noir",
            Self::SolarFlare => "solar-flare",
            Self::ForestZen => "forest-zen",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Classic => Self::Cyberpunk,
            Self::Cyberpunk => Self::NeonNoir,
            Self::NeonNoir => Self::SolarFlare,
            Self::SolarFlare => Self::ForestZen,
            Self::ForestZen => Self::Classic,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Classic => Self::ForestZen,
            Self::Cyberpunk => Self::Classic,
            Self::NeonNoir => Self::Cyberpunk,
            Self::SolarFlare => Self::NeonNoir,
            Self::ForestZen => Self::SolarFlare,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "cyberpunk" => Some(Self::Cyberpunk),
            "neon-noir" | "neonnoir" => Some(Self::NeonNoir),
            "solar-flare" | "solarflare" => Some(Self::SolarFlare),
            "forest-zen" | "forestzen" => Some(Self::ForestZen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    App,
    Feed,
    Assistant,
    Shell,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Feed => "feed",
            Self::Assistant => "assistant",
            Self::Shell => "shell",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<u64>,
    pub source: LogSource,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: LogSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            ts_ms: None,
            source,
            message: message.into(),
        }
    }

    pub fn timestamp_label(&self) -> String {
        self.ts_ms.map(clock_label).unwrap_or_else(|| "--:--:--".to_string())
    }
}

/// Local wall-clock "HH:MM:SS" for a unix-epoch millisecond stamp.
pub fn clock_label(ts_ms: u64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_millis_opt(ts_ms as i64) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => "--:--:--".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        if entry.ts_ms.is_none() {
            entry.ts_ms = Some(chrono::Utc::now().timestamp_millis() as u64);
        }

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Chat input surface plus the single-submission lock.
#[derive(Debug, Clone, Default)]
pub struct ChatInteraction {
    pub input: String,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
    /// One assistant request in flight at a time.
    pub pending: bool,
    /// Tokens streamed so far for the in-flight response.
    pub live_preview: String,
    /// Directives streamed for the in-flight response; folded into the
    /// assistant turn when the stream completes.
    pub pending_directives: Vec<Directive>,
    pub submit_error: Option<String>,
    pub focus_in_chat: bool,
}

/// Locally dispatched canvas entries and their bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct CanvasLocal {
    pub entries: Vec<CanvasEntry>,
    pub removed_ids: Vec<String>,
    /// Dispatch counter. Monotonic, never reset, so local entry keys stay
    /// unique across the session.
    pub next_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Waiting,
    Live,
    Failed,
}

impl FeedStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Live => "live",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashState {
    pub tab: DashTab,
    pub theme: UiTheme,
    /// Append-only raw message log. Normalization re-derives from this.
    pub messages: Vec<ChatMessage>,
    /// Canonical sequence after normalization, as rendered in the chat tab.
    pub normalized: Vec<ChatMessage>,
    pub board: BoardSnapshot,
    pub feed_status: FeedStatus,
    pub doc: DocumentModel,
    pub highlight: HighlightController,
    pub scope: ScopeMode,
    /// Reconciled canvas set, latest derivation.
    pub canvas_entries: Vec<CanvasEntry>,
    pub local: CanvasLocal,
    pub chat: ChatInteraction,
    pub logs: LogBuffer,
}

impl DashState {
    pub fn new(theme: UiTheme) -> Self {
        Self {
            tab: DashTab::Board,
            theme,
            messages: Vec::new(),
            normalized: Vec::new(),
            board: BoardSnapshot::default(),
            feed_status: FeedStatus::default(),
            doc: DocumentModel::with_static_sections(),
            highlight: HighlightController::new(),
            scope: ScopeMode::All,
            canvas_entries: Vec::new(),
            local: CanvasLocal::default(),
            chat: ChatInteraction {
                focus_in_chat: true,
                ..ChatInteraction::default()
            },
            logs: LogBuffer::new(2_000),
        }
    }
}

impl Default for DashState {
    fn default() -> Self {
        Self::new(UiTheme::Classic)
    }
}
