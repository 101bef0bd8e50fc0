use super::message::ChatMessage;
use super::message::Directive;
use super::signal::BoardSnapshot;
use super::state::DashTab;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::UiTheme;

#[derive(Debug, Clone)]
pub enum AtlasAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    ChatInput(char),
    ChatBackspace,
    ChatSubmit,
    ChatHistoryUp,
    ChatHistoryDown,
    SetChatFocus(bool),
    NextTab,
    PrevTab,
    SelectTab(DashTab),
    SetTheme(UiTheme),
    CycleTheme,
    QuickPrompt(usize),
    DismissNote(String),
}

/// Actions fed back from worker threads and adapters. Pure state updates,
/// never effects.
#[derive(Debug, Clone)]
pub enum RuntimeAction {
    AppendMessage(ChatMessage),
    AssistantToken(String),
    AssistantMeta(String),
    AssistantDirective(Directive),
    AssistantDone { error: Option<String> },
    SetBoardSnapshot(BoardSnapshot),
    FeedFailed(String),
    DispatchComponents {
        replace: bool,
        directives: Vec<Directive>,
    },
    AppendLog {
        level: LogLevel,
        source: LogSource,
        message: String,
    },
    ClearLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickPrompt {
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const QUICK_PROMPTS: [QuickPrompt; 6] = [
    QuickPrompt {
        label: "Worst air",
        prompt: "Which city has the worst air quality right now?",
    },
    QuickPrompt {
        label: "Top risk",
        prompt: "Show me the top 3 cities by risk",
    },
    QuickPrompt {
        label: "Strongest quake",
        prompt: "Show me the strongest earthquake",
    },
    QuickPrompt {
        label: "Highlight quakes",
        prompt: "Highlight the quake panel in red",
    },
    QuickPrompt {
        label: "Summarize",
        prompt: "Summarize the current situation across all cities",
    },
    QuickPrompt {
        label: "Reset view",
        prompt: "Show everything and clear the highlights",
    },
];
