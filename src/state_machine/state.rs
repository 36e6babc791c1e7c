//! State tree description
//!
//! Mirrors the xstate JSON exported by the story designer: each node has an
//! `id`, an optional `initial` child, nested `states` and an `on` table
//! mapping event names to `#id` target references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the hierarchical state machine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    /// Child entered when this state is entered without a more specific target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub states: BTreeMap<String, State>,
    /// Event name to target reference (`#id`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, String>,
}

impl State {
    /// A leaf state
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// A grouping state entering `initial` by default
    pub fn group(
        id: impl Into<String>,
        initial: impl Into<String>,
        children: impl IntoIterator<Item = State>,
    ) -> Self {
        Self {
            id: id.into(),
            initial: Some(initial.into()),
            states: children
                .into_iter()
                .map(|child| (child.id.clone(), child))
                .collect(),
            on: BTreeMap::new(),
        }
    }

    /// Add a transition `event -> #target`
    pub fn on(mut self, event: impl Into<String>, target: &str) -> Self {
        self.on.insert(event.into(), format!("#{target}"));
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.states.is_empty()
    }

    /// Depth-first search for a state by id, starting at this node
    pub fn find(&self, id: &str) -> Option<&State> {
        if self.id == id {
            return Some(self);
        }
        self.states.values().find_map(|child| child.find(id))
    }
}

/// Strip the `#` absolute-id marker from an `on` target
pub fn target_id(target: &str) -> &str {
    target.strip_prefix('#').unwrap_or(target)
}
