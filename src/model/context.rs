//! Contexts and intent disambiguation rules

use super::ContextMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named session slot
///
/// When `entity_role` is set, an entity of that role in the user action
/// binds the context at the start of the turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickContext {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_role: Option<String>,
}

impl TickContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_entity_role(mut self, role: impl Into<String>) -> Self {
        self.entity_role = Some(role.into());
        self
    }
}

/// One reading of an ambiguous intent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickIntentAssociation {
    pub action_name: String,
    #[serde(default)]
    pub context_names: BTreeSet<String>,
}

impl TickIntentAssociation {
    pub fn new<I, S>(action_name: impl Into<String>, context_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action_name: action_name.into(),
            context_names: context_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Every association context is bound in `contexts`
    pub fn matches(&self, contexts: &ContextMap) -> bool {
        self.context_names
            .iter()
            .all(|name| contexts.contains_key(name.as_str()))
    }
}

/// Maps an intent to the actions it can mean depending on bound contexts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickIntent {
    pub intent_name: String,
    #[serde(default)]
    pub associations: Vec<TickIntentAssociation>,
}

impl TickIntent {
    pub fn new(
        intent_name: impl Into<String>,
        associations: impl IntoIterator<Item = TickIntentAssociation>,
    ) -> Self {
        Self {
            intent_name: intent_name.into(),
            associations: associations.into_iter().collect(),
        }
    }

    pub fn association_for(&self, action_name: &str) -> Option<&TickIntentAssociation> {
        self.associations
            .iter()
            .find(|association| association.action_name == action_name)
    }
}
