//! Runtime around the processor
//!
//! `StoryRuntime` owns the session store and serializes turns per session
//! id: two turns of one conversation never overlap, while different
//! conversations run concurrently.

mod console;
mod handlers;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use console::{parse_user_action, ConsoleSender};
pub use handlers::{handler_name, HandlerFn, HandlerRegistry, DEV_CONTEXT_COUNT, DEV_TOOLS_NAMESPACE};
pub use traits::*;

use crate::error::RuntimeError;
use crate::processor::{ProcessingResult, TickStoryProcessor, TickUserAction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type SessionLock = Arc<Mutex<()>>;

pub struct StoryRuntime<H, S> {
    processor: TickStoryProcessor<H>,
    store: S,
    locks: Mutex<HashMap<String, SessionLock>>,
}

impl<H: ActionHandlerRepository, S: SessionStore> StoryRuntime<H, S> {
    pub fn new(processor: TickStoryProcessor<H>, store: S) -> Self {
        Self {
            processor,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn processor(&self) -> &TickStoryProcessor<H> {
        &self.processor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one turn of `session_id`.
    ///
    /// The stored session is replaced on success and dropped on redirect.
    /// On error it is left untouched.
    pub async fn handle(
        &self,
        session_id: &str,
        user_action: Option<&TickUserAction>,
        sender: &dyn TickSender,
    ) -> Result<ProcessingResult, RuntimeError> {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(session_id, user_action, sender).await
        };
        self.release_lock(session_id, &lock).await;
        result
    }

    async fn run_turn(
        &self,
        session_id: &str,
        user_action: Option<&TickUserAction>,
        sender: &dyn TickSender,
    ) -> Result<ProcessingResult, RuntimeError> {
        let session = self
            .store
            .load(session_id)
            .await
            .map_err(RuntimeError::Store)?
            .unwrap_or_default();

        let result = self
            .processor
            .process(&session, user_action, sender)
            .await
            .inspect_err(|error| {
                tracing::error!(session = %session_id, %error, "Turn failed");
            })?;

        match &result {
            ProcessingResult::Success { session } => {
                self.store
                    .save(session_id, session)
                    .await
                    .map_err(RuntimeError::Store)?;
            }
            ProcessingResult::Redirect { story_id } => {
                tracing::info!(session = %session_id, redirect = %story_id, "Session handed over");
                self.store
                    .remove(session_id)
                    .await
                    .map_err(RuntimeError::Store)?;
            }
        }
        Ok(result)
    }

    async fn session_lock(&self, session_id: &str) -> SessionLock {
        let mut locks = self.locks.lock().await;
        locks.entry(session_id.to_string()).or_default().clone()
    }

    /// Forget the lock once no other turn holds or awaits it
    async fn release_lock(&self, session_id: &str, lock: &SessionLock) {
        let mut locks = self.locks.lock().await;
        // The map and the caller's handle are the only owners left
        if Arc::strong_count(lock) <= 2 {
            locks.remove(session_id);
        }
    }
}
