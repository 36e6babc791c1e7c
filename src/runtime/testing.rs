//! Mock implementations for testing
//!
//! These mocks record every call so turn tests can assert on exactly what
//! the engine emitted and invoked.

use super::traits::*;
use crate::error::HandlerError;
use crate::model::ContextMap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// Mock Sender
// ============================================================================

/// One recorded sender call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    SendById(String),
    EndById(String),
    SendPlainText(String),
    EndPlainText(String),
    End,
}

/// Sender recording every call in order
#[derive(Debug, Default)]
pub struct MockSender {
    pub calls: Mutex<Vec<Sent>>,
}

#[allow(dead_code)]
impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Sent> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_by_id(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter_map(|call| match call {
                Sent::SendById(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn ended_by_id(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter_map(|call| match call {
                Sent::EndById(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn plain_texts(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter_map(|call| match call {
                Sent::SendPlainText(text) | Sent::EndPlainText(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn end_count(&self) -> usize {
        self.recorded()
            .iter()
            .filter(|call| matches!(call, Sent::End))
            .count()
    }

    /// Number of turn-closing calls of any kind
    pub fn terminal_count(&self) -> usize {
        self.recorded()
            .iter()
            .filter(|call| matches!(call, Sent::End | Sent::EndById(_) | Sent::EndPlainText(_)))
            .count()
    }

    fn record(&self, call: Sent) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TickSender for MockSender {
    async fn send_by_id(&self, answer_id: &str) {
        self.record(Sent::SendById(answer_id.to_string()));
    }

    async fn end_by_id(&self, answer_id: &str) {
        self.record(Sent::EndById(answer_id.to_string()));
    }

    async fn send_plain_text(&self, text: &str) {
        self.record(Sent::SendPlainText(text.to_string()));
    }

    async fn end_plain_text(&self, text: &str) {
        self.record(Sent::EndPlainText(text.to_string()));
    }

    async fn end(&self) {
        self.record(Sent::End);
    }
}

// ============================================================================
// Mock Handler Repository
// ============================================================================

/// Handler repository returning predefined bindings
#[derive(Debug, Default)]
pub struct MockHandlerRepository {
    outputs: HashMap<String, Result<ContextMap, HandlerError>>,
    /// Record of invocations with the contexts they saw
    pub invocations: Mutex<Vec<(String, ContextMap)>>,
}

#[allow(dead_code)]
impl MockHandlerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler binding each of `contexts` to `null`
    #[must_use]
    pub fn with_null_outputs(mut self, handler: &str, contexts: &[&str]) -> Self {
        let output = contexts
            .iter()
            .map(|name| ((*name).to_string(), None))
            .collect();
        self.outputs.insert(handler.to_string(), Ok(output));
        self
    }

    #[must_use]
    pub fn with_output(mut self, handler: &str, output: ContextMap) -> Self {
        self.outputs.insert(handler.to_string(), Ok(output));
        self
    }

    #[must_use]
    pub fn with_failure(mut self, handler: &str, message: &str) -> Self {
        self.outputs.insert(
            handler.to_string(),
            Err(HandlerError::failed(handler, message)),
        );
        self
    }

    pub fn invoked(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ActionHandlerRepository for MockHandlerRepository {
    async fn invoke(&self, handler: &str, contexts: &ContextMap) -> Result<ContextMap, HandlerError> {
        self.invocations
            .lock()
            .unwrap()
            .push((handler.to_string(), contexts.clone()));
        self.outputs
            .get(handler)
            .cloned()
            .unwrap_or_else(|| Err(HandlerError::NotFound(handler.to_string())))
    }

    fn contains(&self, handler: &str) -> bool {
        self.outputs.contains_key(handler)
    }
}
