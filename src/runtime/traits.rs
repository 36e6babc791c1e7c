//! Trait abstractions for engine I/O
//!
//! The processor talks to the outside world only through these traits, so
//! turns can be tested against the recording mocks in `testing`.

use crate::error::HandlerError;
use crate::model::ContextMap;
use crate::processor::TickSession;
use async_trait::async_trait;
use std::sync::Arc;

/// Connector-side answer emitter
///
/// `send*` calls may happen several times per turn; at most one of the
/// `end*` calls closes a terminal turn.
#[async_trait]
pub trait TickSender: Send + Sync {
    async fn send_by_id(&self, answer_id: &str);

    async fn end_by_id(&self, answer_id: &str);

    async fn send_plain_text(&self, text: &str);

    async fn end_plain_text(&self, text: &str);

    /// Close the turn without a message
    async fn end(&self);
}

/// Registry of side-effecting action handlers
#[async_trait]
pub trait ActionHandlerRepository: Send + Sync {
    /// Run `handler` against the current bindings and return the bindings
    /// it produces
    async fn invoke(&self, handler: &str, contexts: &ContextMap) -> Result<ContextMap, HandlerError>;

    fn contains(&self, handler: &str) -> bool;
}

/// Storage for sessions between turns
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<TickSession>, String>;

    async fn save(&self, session_id: &str, session: &TickSession) -> Result<(), String>;

    async fn remove(&self, session_id: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TickSender + ?Sized> TickSender for Arc<T> {
    async fn send_by_id(&self, answer_id: &str) {
        (**self).send_by_id(answer_id).await;
    }

    async fn end_by_id(&self, answer_id: &str) {
        (**self).end_by_id(answer_id).await;
    }

    async fn send_plain_text(&self, text: &str) {
        (**self).send_plain_text(text).await;
    }

    async fn end_plain_text(&self, text: &str) {
        (**self).end_plain_text(text).await;
    }

    async fn end(&self) {
        (**self).end().await;
    }
}

#[async_trait]
impl<T: ActionHandlerRepository + ?Sized> ActionHandlerRepository for Arc<T> {
    async fn invoke(&self, handler: &str, contexts: &ContextMap) -> Result<ContextMap, HandlerError> {
        (**self).invoke(handler, contexts).await
    }

    fn contains(&self, handler: &str) -> bool {
        (**self).contains(handler)
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, session_id: &str) -> Result<Option<TickSession>, String> {
        (**self).load(session_id).await
    }

    async fn save(&self, session_id: &str, session: &TickSession) -> Result<(), String> {
        (**self).save(session_id, session).await
    }

    async fn remove(&self, session_id: &str) -> Result<(), String> {
        (**self).remove(session_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Process-local session storage
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: tokio::sync::RwLock<std::collections::HashMap<String, TickSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<TickSession>, String> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, session: &TickSession) -> Result<(), String> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session.clone());
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<(), String> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
