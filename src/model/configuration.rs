//! Story configuration aggregate

use super::{
    ContextMap, TickAction, TickContext, TickIntent, TickIntentAssociation, TickStorySettings,
    TickUnknownConfiguration,
};
use crate::error::ConfigError;
use crate::state_machine::{State, StateMachine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Everything a story designer declares, as exported to JSON
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickConfiguration {
    pub state_machine: State,
    #[serde(default)]
    pub contexts: Vec<TickContext>,
    /// Declaration order is the planner's tie-break order
    #[serde(default)]
    pub actions: Vec<TickAction>,
    #[serde(default)]
    pub intents_contexts: Vec<TickIntent>,
    #[serde(default)]
    pub unknown_handle_configuration: TickUnknownConfiguration,
    #[serde(default)]
    pub story_settings: TickStorySettings,
    #[serde(default)]
    pub debug: bool,
}

impl TickConfiguration {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn action(&self, name: &str) -> Option<&TickAction> {
        self.actions.iter().find(|action| action.name == name)
    }

    pub fn context(&self, name: &str) -> Option<&TickContext> {
        self.contexts.iter().find(|context| context.name == name)
    }

    pub fn intent(&self, intent_name: &str) -> Option<&TickIntent> {
        self.intents_contexts
            .iter()
            .find(|intent| intent.intent_name == intent_name)
    }

    /// Actions binding `context`, in declaration order
    pub fn producers<'a>(&'a self, context: &'a str) -> impl Iterator<Item = &'a TickAction> {
        self.actions.iter().filter(move |action| action.produces(context))
    }

    /// Associations of `intent_name` whose contexts are all bound
    pub fn matching_associations<'a>(
        &'a self,
        intent_name: &str,
        contexts: &ContextMap,
    ) -> Vec<&'a TickIntentAssociation> {
        self.intent(intent_name)
            .map(|intent| {
                intent
                    .associations
                    .iter()
                    .filter(|association| association.matches(contexts))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_unknown_intent(&self, intent_name: &str) -> bool {
        self.unknown_handle_configuration
            .is_unknown_intent(intent_name)
    }
}

/// A configuration checked against its own state machine
#[derive(Debug, Clone)]
pub struct TickStory {
    id: String,
    configuration: TickConfiguration,
    state_machine: StateMachine,
}

impl TickStory {
    /// Compile `configuration`, rejecting structural inconsistencies
    pub fn new(id: impl Into<String>, configuration: TickConfiguration) -> Result<Self, ConfigError> {
        let state_machine = StateMachine::new(configuration.state_machine.clone())?;
        let issues = structural_issues(&configuration, &state_machine);
        if !issues.is_empty() {
            return Err(ConfigError::Story(issues));
        }
        let id = id.into();
        tracing::debug!(
            story = %id,
            actions = configuration.actions.len(),
            debug = configuration.debug,
            "Story loaded"
        );
        Ok(Self {
            id,
            configuration,
            state_machine,
        })
    }

    /// Load a story file; the file stem is the story id
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let id = path
            .file_stem()
            .map_or_else(|| "story".to_string(), |stem| stem.to_string_lossy().into_owned());
        Self::new(id, TickConfiguration::from_json_str(&json)?)
    }

    /// Force the debug flag
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.configuration.debug = debug;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn configuration(&self) -> &TickConfiguration {
        &self.configuration
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.state_machine
    }

    pub fn settings(&self) -> &TickStorySettings {
        &self.configuration.story_settings
    }

    pub fn is_debug(&self) -> bool {
        self.configuration.debug
    }
}

/// Issues that would make turns fail rather than just misbehave
fn structural_issues(configuration: &TickConfiguration, state_machine: &StateMachine) -> Vec<String> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();

    for action in &configuration.actions {
        if !seen.insert(action.name.as_str()) {
            issues.push(format!("Action {} is declared twice", action.name));
        }
        if !state_machine.is_leaf(&action.name) {
            issues.push(format!("Action {} is not a leaf state", action.name));
        }
    }

    for state in state_machine.leaf_states() {
        if !seen.contains(state) {
            issues.push(format!("State {state} has no action"));
        }
    }

    for association in configuration
        .intents_contexts
        .iter()
        .flat_map(|intent| &intent.associations)
    {
        if !seen.contains(association.action_name.as_str()) {
            issues.push(format!(
                "Intent association action {} not found in declared actions",
                association.action_name
            ));
        }
    }

    for config in &configuration.unknown_handle_configuration.unknown_answer_configs {
        if !seen.contains(config.action.as_str()) {
            issues.push(format!(
                "Unknown answer action {} not found in declared actions",
                config.action
            ));
        }
    }

    issues
}
