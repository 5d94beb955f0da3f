//! In-process snapshot store.
//!
//! Behaves like the snapshot service: a session has to exist before
//! anything can be read from or written to it.

use crate::store::{SessionId, SnapshotStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    sessions: DashMap<SessionId, HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session if it does not exist yet
    pub fn create_session(&self, session: SessionId) {
        self.sessions.entry(session).or_default();
    }

    pub fn with_session(session: SessionId) -> Self {
        let store = Self::new();
        store.create_session(session);
        store
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<String>, StoreError> {
        let data = self
            .sessions
            .get(&session)
            .ok_or(StoreError::SessionNotFound(session))?;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, session: SessionId, key: &str, value: String) -> Result<(), StoreError> {
        let mut data = self
            .sessions
            .get_mut(&session)
            .ok_or(StoreError::SessionNotFound(session))?;
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, session: SessionId, key: &str) -> Result<(), StoreError> {
        let mut data = self
            .sessions
            .get_mut(&session)
            .ok_or(StoreError::SessionNotFound(session))?;
        data.remove(key);
        Ok(())
    }
}
