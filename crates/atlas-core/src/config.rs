use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    pub assistant: AssistantConfig,
    pub feed: FeedConfig,
    pub ui: UiConfig,
}

/// External assistant process. `command` is split on whitespace; the prompt
/// is appended as the final argument.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub command: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub command: Option<String>,
    pub refresh_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            command: None,
            refresh_secs: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub theme: Option<String>,
}
