//! Persistence and polling sync for shared chess board sessions.
//!
//! A [`SessionStore`] owns a session's game value and writes an envelope to
//! a [`SnapshotStore`] after every change. A [`SyncEngine`] polls the same
//! snapshot and overwrites the local game with whatever it fetched.
//!
//! # Modules
//!
//! - [`store`]: Snapshot store contract and session ids
//! - [`http`]: Snapshot service client
//! - [`memory`]: In-process snapshot store
//! - [`session`]: Session store
//! - [`merge`]: Merge policy applied to fetched snapshots
//! - [`sync`]: Polling sync engine
//! - [`config`]: Environment configuration
//! - [`commands`]: Terminal client commands

pub mod commands;
pub mod config;
pub mod http;
pub mod memory;
pub mod merge;
pub mod session;
pub mod store;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use http::HttpSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use merge::{LastFetchWins, MergePolicy};
pub use session::SessionStore;
pub use store::{snapshot_key, SessionId, SnapshotStore, StoreError};
pub use sync::{SyncEngine, SyncHandle, SyncOutcome};
