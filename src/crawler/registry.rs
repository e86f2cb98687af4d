//! Session registry
//!
//! Maps session ids to the control handles of running engines so an operator can
//! pause, resume or stop a crawl by id. Unknown ids are ignored.

use crate::crawler::control::CrawlControl;
use crate::crawler::engine::CrawlEngine;
use crate::state::{CrawlState, SessionId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe map of active sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, CrawlControl>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine under `id`, replacing any previous entry
    ///
    /// Returns the control handle that was replaced, if any.
    pub fn register(&self, id: impl Into<SessionId>, engine: &CrawlEngine) -> Option<CrawlControl> {
        self.register_control(id, engine.control())
    }

    /// Registers a bare control handle under `id`
    pub fn register_control(
        &self,
        id: impl Into<SessionId>,
        control: CrawlControl,
    ) -> Option<CrawlControl> {
        let id = id.into();
        tracing::debug!(session = %id, "Registering session");
        self.write().insert(id, control)
    }

    /// Removes a session; returns false if it was not registered
    pub fn unregister(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    pub fn pause(&self, id: &str) -> bool {
        self.with_control(id, CrawlControl::pause)
    }

    pub fn resume(&self, id: &str) -> bool {
        self.with_control(id, CrawlControl::resume)
    }

    pub fn stop(&self, id: &str) -> bool {
        self.with_control(id, CrawlControl::stop)
    }

    /// Lifecycle state of a registered session
    pub fn state(&self, id: &str) -> Option<CrawlState> {
        self.read().get(id).map(CrawlControl::state)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered ids in sorted order
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn with_control(&self, id: &str, action: impl FnOnce(&CrawlControl)) -> bool {
        match self.read().get(id) {
            Some(control) => {
                action(control);
                true
            }
            None => {
                tracing::debug!(session = %id, "No such session");
                false
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, CrawlControl>> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, CrawlControl>> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
