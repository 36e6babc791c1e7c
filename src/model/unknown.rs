//! Fallback answers for unrecognized input

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Intent name the NLU layer reports for unrecognized input
pub const UNKNOWN: &str = "unknown";

fn default_unknown_intent() -> String {
    UNKNOWN.to_string()
}

/// Answer to give when an unknown intent arrives right after `action` ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickUnknownAnswerConfig {
    #[serde(default = "default_unknown_intent")]
    pub intent: String,
    pub action: String,
    pub answer_id: String,
}

impl TickUnknownAnswerConfig {
    pub fn new(action: impl Into<String>, answer_id: impl Into<String>) -> Self {
        Self {
            intent: default_unknown_intent(),
            action: action.into(),
            answer_id: answer_id.into(),
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickUnknownConfiguration {
    #[serde(default)]
    pub unknown_answer_configs: Vec<TickUnknownAnswerConfig>,
}

impl TickUnknownConfiguration {
    pub fn new(configs: impl IntoIterator<Item = TickUnknownAnswerConfig>) -> Self {
        Self {
            unknown_answer_configs: configs.into_iter().collect(),
        }
    }

    /// Intents routed to unknown handling: [`UNKNOWN`] plus any configured one
    pub fn unknown_intents(&self) -> BTreeSet<&str> {
        std::iter::once(UNKNOWN)
            .chain(
                self.unknown_answer_configs
                    .iter()
                    .map(|config| config.intent.as_str()),
            )
            .collect()
    }

    pub fn is_unknown_intent(&self, intent: &str) -> bool {
        intent == UNKNOWN
            || self
                .unknown_answer_configs
                .iter()
                .any(|config| config.intent == intent)
    }

    /// Config for `action`, preferring one declared for `intent`
    pub fn find(&self, action: &str, intent: &str) -> Option<&TickUnknownAnswerConfig> {
        let mut candidates = self
            .unknown_answer_configs
            .iter()
            .filter(|config| config.action == action);
        let first = candidates.next()?;
        if first.intent == intent {
            return Some(first);
        }
        Some(
            candidates
                .find(|config| config.intent == intent)
                .unwrap_or(first),
        )
    }
}
