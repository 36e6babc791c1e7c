//! Hierarchical dialog state machine
//!
//! A story's states form a tree loaded from xstate-style JSON. Events are
//! resolved by walking from the current state towards the root; the first
//! state declaring the event supplies the target, which is then entered
//! through its initial children down to a leaf.

mod machine;
pub mod state;

#[cfg(test)]
mod proptests;

pub use machine::{StateMachine, StateMachineError};
pub use state::State;

/// Conventional top-level state that turns start from
pub const GLOBAL_STATE: &str = "Global";
