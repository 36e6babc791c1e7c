//! Plannable actions

use super::ContextMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A unit of work the planner can schedule
///
/// The name matches a leaf state of the story's state machine. Inputs are
/// preconditions on the session contexts, outputs are the contexts the
/// handler is expected to bind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default)]
    pub input_context_names: BTreeSet<String>,
    #[serde(default)]
    pub output_context_names: BTreeSet<String>,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_story: Option<String>,
}

impl TickAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_answer(mut self, answer_id: impl Into<String>) -> Self {
        self.answer_id = Some(answer_id.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_context_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_context_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn with_target_story(mut self, story_id: impl Into<String>) -> Self {
        self.target_story = Some(story_id.into());
        self
    }

    pub fn final_action(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Answer to emit, if any
    pub fn answer(&self) -> Option<&str> {
        self.answer_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// A silent action emits nothing and lets the turn continue
    pub fn is_silent(&self) -> bool {
        self.answer().is_none()
    }

    /// Handler name, ignoring blank declarations
    pub fn handler_name(&self) -> Option<&str> {
        self.handler.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn target_story(&self) -> Option<&str> {
        self.target_story.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn produces(&self, context: &str) -> bool {
        self.output_context_names.contains(context)
    }

    /// Input contexts not yet bound (a `null` binding counts as bound)
    pub fn missing_inputs<'a>(&'a self, contexts: &'a ContextMap) -> impl Iterator<Item = &'a str> {
        self.input_context_names
            .iter()
            .filter(|name| !contexts.contains_key(name.as_str()))
            .map(String::as_str)
    }

    pub fn inputs_satisfied(&self, contexts: &ContextMap) -> bool {
        self.missing_inputs(contexts).next().is_none()
    }
}
