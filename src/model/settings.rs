//! Per-story knobs

use super::UNKNOWN;
use serde::{Deserialize, Serialize};

const DEFAULT_REPETITION_NB: u32 = 2;

fn default_repetition_nb() -> u32 {
    DEFAULT_REPETITION_NB
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickStorySettings {
    /// Turns the same objective may repeat before the story gives up
    #[serde(
        rename = "repetitionNb",
        alias = "maxRepetitionNb",
        default = "default_repetition_nb"
    )]
    pub max_repetition_nb: u32,
    #[serde(
        default,
        alias = "redirectStoryId",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect_story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_answer_id: Option<String>,
}

impl Default for TickStorySettings {
    fn default() -> Self {
        Self {
            max_repetition_nb: DEFAULT_REPETITION_NB,
            redirect_story: None,
            unknown_answer_id: None,
        }
    }
}

impl TickStorySettings {
    /// Story to hand over to when this one gives up
    pub fn redirect_target(&self) -> String {
        self.redirect_story
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    /// Whether a counter that reached `repeated` is over the limit
    pub fn exceeded(&self, repeated: u32) -> bool {
        repeated > self.max_repetition_nb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: TickStorySettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, TickStorySettings::default());
        assert_eq!(settings.max_repetition_nb, 2);
        assert_eq!(settings.redirect_target(), UNKNOWN);
    }

    #[test]
    fn test_redirect_target() {
        let settings: TickStorySettings =
            serde_json::from_str(r#"{ "repetitionNb": 1, "redirectStory": "fallback" }"#).unwrap();
        assert_eq!(settings.redirect_target(), "fallback");
        assert!(!settings.exceeded(1));
        assert!(settings.exceeded(2));
    }
}
