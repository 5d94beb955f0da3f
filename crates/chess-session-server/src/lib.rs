//! Snapshot service for shared chess board sessions.
//!
//! Keeps, per session, a map of names to opaque state strings and exposes
//! it over HTTP. Clients store their encoded game envelope under
//! `game-{id}` and poll it back. Data lives in memory for the lifetime of
//! the process.

pub mod error;
pub mod protocol;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use server::{router, run_server, serve, ServerState};
pub use session::SessionData;
