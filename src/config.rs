//! Process-level settings read from the environment

use std::path::PathBuf;

const DEFAULT_SESSION_ID: &str = "console";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Story file driven by the console
    pub story_path: Option<PathBuf>,
    /// Overrides the story's own debug flag when set
    pub debug_enabled: Option<bool>,
    /// Whether the surrounding bot declares an ending-story rule
    pub ending_story_rule: bool,
    pub session_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            story_path: None,
            debug_enabled: None,
            ending_story_rule: false,
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).and_then(|value| parse_flag(key, &value));
        Self {
            story_path: lookup("TICK_STORY_PATH").map(PathBuf::from),
            debug_enabled: flag("TICK_DEBUG_ENABLED"),
            ending_story_rule: flag("TICK_ENDING_STORY_RULE").unwrap_or(false),
            session_id: lookup("TICK_SESSION_ID")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value, "Ignoring unparseable boolean setting");
            None
        }
    }
}
