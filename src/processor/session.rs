//! Per-conversation state and turn I/O types

use crate::model::{ContextMap, TickUnknownAnswerConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consecutive turns that started by executing the same action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickActionHandlingStep {
    pub action_name: String,
    pub repeated: u32,
}

impl TickActionHandlingStep {
    pub fn new(action_name: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            repeated: 0,
        }
    }

    /// Step for a turn starting with `action_name`, continuing the count
    /// when the previous turn started the same way
    pub fn advance(previous: Option<&Self>, action_name: &str) -> Self {
        match previous {
            Some(step) if step.action_name == action_name => Self {
                action_name: step.action_name.clone(),
                repeated: step.repeated.saturating_add(1),
            },
            _ => Self::new(action_name),
        }
    }
}

/// Consecutive unknown-intent turns answered with the same fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickUnknownHandlingStep {
    pub repeated: u32,
    pub answer_config: TickUnknownAnswerConfig,
}

impl TickUnknownHandlingStep {
    pub fn advance(previous: Option<&Self>, answer_config: TickUnknownAnswerConfig) -> Self {
        let repeated = match previous {
            Some(step) if step.answer_config == answer_config => step.repeated.saturating_add(1),
            _ => 1,
        };
        Self {
            repeated,
            answer_config,
        }
    }
}

/// Everything the engine remembers between two turns of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(default)]
    pub contexts: ContextMap,
    #[serde(default)]
    pub ran_handlers: Vec<String>,
    /// Pending objectives, top of stack last
    #[serde(default)]
    pub objectives_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handling_step: Option<TickActionHandlingStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_handling_step: Option<TickUnknownHandlingStep>,
    #[serde(default)]
    pub finished: bool,
}

impl TickSession {
    pub fn last_ran_handler(&self) -> Option<&str> {
        self.ran_handlers.last().map(String::as_str)
    }

    /// Push unless `objective` is already on top
    pub fn push_objective(&mut self, objective: &str) {
        if self.objectives_stack.last().map(String::as_str) != Some(objective) {
            self.objectives_stack.push(objective.to_string());
        }
    }
}

/// What the user said, as resolved by the NLU layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickUserAction {
    pub intent_name: String,
    /// Entity values keyed by entity role
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl TickUserAction {
    pub fn new(intent_name: impl Into<String>) -> Self {
        Self {
            intent_name: intent_name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, role: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(role.into(), value.into());
        self
    }
}

/// Outcome of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessingResult {
    /// The story continues; persist this session for the next turn
    Success { session: TickSession },
    /// Abandon this story session and hand over to another story
    Redirect {
        #[serde(rename = "storyId")]
        story_id: String,
    },
}

impl ProcessingResult {
    pub fn session(&self) -> Option<&TickSession> {
        match self {
            Self::Success { session } => Some(session),
            Self::Redirect { .. } => None,
        }
    }

    pub fn redirect_story(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Redirect { story_id } => Some(story_id),
        }
    }
}
