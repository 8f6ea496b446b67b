//! Application State

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chat_core::{Assistant, SessionId, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Conversation pipeline
    pub assistant: Arc<Assistant>,

    /// Session persistence (memory or files)
    pub store: Arc<dyn SessionStore>,

    /// Sessions with a turn in flight
    busy: Arc<Mutex<HashSet<SessionId>>>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            assistant,
            store,
            busy: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Mark a session busy for the lifetime of the returned guard.
    ///
    /// `None` when the session already has a turn in flight.
    pub fn begin_turn(&self, id: &SessionId) -> Option<TurnGuard> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(id.clone()) {
            return None;
        }

        Some(TurnGuard {
            id: id.clone(),
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self, id: &SessionId) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

/// Clears the busy flag when dropped
pub struct TurnGuard {
    id: SessionId,
    busy: Arc<Mutex<HashSet<SessionId>>>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
