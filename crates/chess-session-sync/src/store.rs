//! Snapshot storage contract.
//!
//! A snapshot store keeps one string blob per `(session, name)` pair. The
//! session layer writes the encoded envelope under [`snapshot_key`] and the
//! sync engine reads it back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Numeric id of a shared board session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SessionId)
    }
}

/// Name the game snapshot of a session is stored under
pub fn snapshot_key(session: SessionId) -> String {
    format!("game-{}", session)
}

/// Errors talking to a snapshot store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Snapshot service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Session {0} not found")]
    SessionNotFound(SessionId),
}

/// Durable keyed blob storage scoped to a session
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stored value, or `None` when nothing is stored under `key`
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, session: SessionId, key: &str, value: String) -> Result<(), StoreError>;

    /// Removing an absent key succeeds
    async fn delete(&self, session: SessionId, key: &str) -> Result<(), StoreError>;
}
