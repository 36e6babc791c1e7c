//! Error types for the Tick engine

use crate::state_machine::StateMachineError;
use thiserror::Error;

/// Failures detected while loading a story configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read story file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid story JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid state machine: {0}")]
    StateMachine(#[from] StateMachineError),
    #[error("Invalid story configuration: {}", .0.join("; "))]
    Story(Vec<String>),
}

/// Failure reported by an action handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("Action handler not found: {0}")]
    NotFound(String),
    #[error("Action handler {handler} failed: {message}")]
    Failed { handler: String, message: String },
}

impl HandlerError {
    pub fn failed(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

/// Errors that abort a turn
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error("TickAction <{0}> not found")]
    UnknownAction(String),
}

/// Errors raised by the session-serializing runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Session store error: {0}")]
    Store(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
