//! Linkchess - shared chess board sessions
//!
//! This crate provides the synchronous core of a shared board session:
//! - The game state value that is persisted and synced between viewers
//! - A roster of named participants and their seats
//! - The rules capability used to validate moves and derive status flags
//! - The game state machine (move, undo, reset, load)
//! - The versioned envelope used on the wire and in storage
//!
//! # Architecture
//!
//! Nothing in this crate performs I/O. Persistence and polling live in
//! `chess-session-sync`, which drives a [`GameStateMachine`] from a shared
//! slot and writes [`Envelope`]s to a snapshot store.
//!
//! # Modules
//!
//! - [`state`]: Sides, users, history entries and the `GameState` value
//! - [`roster`]: Participant list keyed by name
//! - [`rules`]: Rules engine trait and the standard chess implementation
//! - [`machine`]: Game state machine
//! - [`envelope`]: Versioned snapshot codec

pub mod envelope;
pub mod machine;
pub mod roster;
pub mod rules;
pub mod state;

// Re-export commonly used types
pub use envelope::{Envelope, EnvelopeError, ENVELOPE_VERSION};
pub use machine::GameStateMachine;
pub use roster::Roster;
pub use rules::{Applied, MoveRequest, RulesEngine, RulesError, StandardChess};
pub use state::{GameState, HistoryEntry, Seat, Side, StatusFlags, User, INITIAL_FEN};
