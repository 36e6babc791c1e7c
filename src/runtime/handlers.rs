//! Namespaced action handler registry
//!
//! Handlers are addressed as `namespace:handler_id`. The `dev-tools`
//! namespace provides `set_context_<n>` handlers used while designing
//! stories: each binds `DEV_CONTEXT_<n>` to `null`.

use super::traits::ActionHandlerRepository;
use crate::error::HandlerError;
use crate::model::ContextMap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const DEV_TOOLS_NAMESPACE: &str = "dev-tools";

/// Number of `set_context_<n>` handlers in the dev-tools namespace
pub const DEV_CONTEXT_COUNT: usize = 10;

pub type HandlerFn = Arc<dyn Fn(&ContextMap) -> Result<ContextMap, HandlerError> + Send + Sync>;

pub fn handler_name(namespace: &str, id: &str) -> String {
    format!("{namespace}:{id}")
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, namespace: &str, id: &str, handler: F)
    where
        F: Fn(&ContextMap) -> Result<ContextMap, HandlerError> + Send + Sync + 'static,
    {
        let name = handler_name(namespace, id);
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::warn!(handler = %name, "Handler registered twice, keeping the last one");
        }
    }

    /// Add the dev-tools namespace
    #[must_use]
    pub fn with_dev_tools(mut self) -> Self {
        for index in 1..=DEV_CONTEXT_COUNT {
            let context = format!("DEV_CONTEXT_{index}");
            self.register(
                DEV_TOOLS_NAMESPACE,
                &format!("set_context_{index}"),
                move |_| Ok(ContextMap::from([(context.clone(), None)])),
            );
        }
        self
    }

    /// Registered handler names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[async_trait]
impl ActionHandlerRepository for HandlerRegistry {
    async fn invoke(&self, handler: &str, contexts: &ContextMap) -> Result<ContextMap, HandlerError> {
        let function = self
            .handlers
            .get(handler)
            .ok_or_else(|| HandlerError::NotFound(handler.to_string()))?;
        function(contexts)
    }

    fn contains(&self, handler: &str) -> bool {
        self.handlers.contains_key(handler)
    }
}
