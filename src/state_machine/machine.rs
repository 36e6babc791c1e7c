//! Validated state machine with event resolution
//!
//! The tree is flattened into an id-indexed node table at load time so the
//! parent walk in [`StateMachine::resolve_event`] and the initial-child
//! descent in [`StateMachine::enter`] are plain lookups.

use super::state::{target_id, State};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Reasons a state tree is rejected at load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("Duplicate state ids: {}", .0.join(", "))]
    DuplicateStates(Vec<String>),
    #[error("States transitioning to themselves: {}", .0.join(", "))]
    SelfLoops(Vec<String>),
    #[error("State {state} has transition {event} to unknown state {target}")]
    UnknownTarget {
        state: String,
        event: String,
        target: String,
    },
    #[error("Group state {0} has no initial child")]
    MissingInitial(String),
    #[error("State {state} has initial {initial} which is not one of its children")]
    UnknownInitial { state: String, initial: String },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<String>,
    initial: Option<String>,
    children: Vec<String>,
    on: Vec<(String, String)>,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A loaded, validated state hierarchy
#[derive(Debug, Clone)]
pub struct StateMachine {
    root: State,
    nodes: HashMap<String, Node>,
}

impl StateMachine {
    /// Validate and index a state tree
    pub fn new(root: State) -> Result<Self, StateMachineError> {
        let mut nodes = HashMap::new();
        let mut duplicates = BTreeSet::new();
        index(&root, None, &mut nodes, &mut duplicates);

        if !duplicates.is_empty() {
            return Err(StateMachineError::DuplicateStates(
                duplicates.into_iter().collect(),
            ));
        }

        let mut self_loops: Vec<String> = nodes
            .iter()
            .filter(|(id, node)| node.on.iter().any(|(_, target)| target == *id))
            .map(|(id, _)| id.clone())
            .collect();
        if !self_loops.is_empty() {
            self_loops.sort();
            return Err(StateMachineError::SelfLoops(self_loops));
        }

        let mut ids: Vec<&String> = nodes.keys().collect();
        ids.sort();
        for id in ids {
            let node = &nodes[id];
            for (event, target) in &node.on {
                if !nodes.contains_key(target) {
                    return Err(StateMachineError::UnknownTarget {
                        state: id.clone(),
                        event: event.clone(),
                        target: target.clone(),
                    });
                }
            }
            if node.is_leaf() {
                continue;
            }
            match &node.initial {
                None => return Err(StateMachineError::MissingInitial(id.clone())),
                Some(initial) if !node.children.contains(initial) => {
                    return Err(StateMachineError::UnknownInitial {
                        state: id.clone(),
                        initial: initial.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(Self { root, nodes })
    }

    pub fn root(&self) -> &State {
        &self.root
    }

    pub fn root_id(&self) -> &str {
        &self.root.id
    }

    pub fn get_state(&self, id: &str) -> Option<&State> {
        self.root.find(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_leaf(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(Node::is_leaf)
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.nodes.get(id)?.parent.as_deref()
    }

    /// State a turn starts from when the session has none: `Global` when
    /// the tree declares it, otherwise the root.
    pub fn default_state(&self) -> &str {
        match self.nodes.get_key_value(super::GLOBAL_STATE) {
            Some((id, _)) => id.as_str(),
            None => self.root_id(),
        }
    }

    /// Descend through initial children until a leaf is reached.
    ///
    /// Returns `None` for an unknown id. Initial children are always direct
    /// children (checked at load), so the descent is bounded by tree depth.
    pub fn enter(&self, id: &str) -> Option<&str> {
        let (mut current, mut node) = self.nodes.get_key_value(id)?;
        loop {
            if node.is_leaf() {
                return Some(current.as_str());
            }
            (current, node) = self.nodes.get_key_value(node.initial.as_deref()?)?;
        }
    }

    /// Resolve `event` from `current`: the nearest state on the path to the
    /// root that handles it wins, and its target is entered down to a leaf.
    pub fn resolve_event(&self, current: &str, event: &str) -> Option<&str> {
        let mut cursor = Some(self.nodes.get_key_value(current)?.0.as_str());
        while let Some(id) = cursor {
            let node = self.nodes.get(id)?;
            if let Some((_, target)) = node.on.iter().find(|(name, _)| name == event) {
                return self.enter(target);
            }
            cursor = node.parent.as_deref();
        }
        None
    }

    /// Whether any state handles `event`
    pub fn contains_transition(&self, event: &str) -> bool {
        self.nodes
            .values()
            .any(|node| node.on.iter().any(|(name, _)| name == event))
    }

    /// Every event name handled somewhere in the tree
    pub fn transitions(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .flat_map(|node| node.on.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    /// Ids of all non-group states
    pub fn leaf_states(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Ids of all states, groups included
    pub fn state_ids(&self) -> HashSet<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}

fn index(
    state: &State,
    parent: Option<&str>,
    nodes: &mut HashMap<String, Node>,
    duplicates: &mut BTreeSet<String>,
) {
    let node = Node {
        parent: parent.map(str::to_string),
        initial: state.initial.clone(),
        children: state.states.values().map(|child| child.id.clone()).collect(),
        on: state
            .on
            .iter()
            .map(|(event, target)| (event.clone(), target_id(target).to_string()))
            .collect(),
    };
    if nodes.insert(state.id.clone(), node).is_some() {
        duplicates.insert(state.id.clone());
    }
    for child in state.states.values() {
        index(child, Some(&state.id), nodes, duplicates);
    }
}
