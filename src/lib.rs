//! Tick dialog engine
//!
//! Drives configured conversational stories turn by turn: a hierarchical
//! state machine resolves the user's intent to an objective, a backward
//! chaining planner orders the actions needed to reach it, and the story
//! processor runs them, emitting answers through a [`runtime::TickSender`].

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod error;
pub mod model;
pub mod processor;
pub mod runtime;
pub mod solver;
pub mod state_machine;
pub mod validation;

pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, EngineResult, HandlerError, RuntimeError};
pub use model::{ContextMap, TickAction, TickConfiguration, TickStory};
pub use processor::{ProcessingResult, TickSession, TickStoryProcessor, TickUserAction};
pub use runtime::{
    ActionHandlerRepository, HandlerRegistry, InMemorySessionStore, SessionStore, StoryRuntime,
    TickSender,
};
pub use state_machine::{State, StateMachine};
pub use validation::{validate_tick_story, StoryDeclaration};
