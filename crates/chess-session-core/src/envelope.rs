//! Versioned snapshot envelope.
//!
//! Stored and synced snapshots are the JSON string
//! `{"version":0,"state":{"game":<GameState>}}`. The version is checked
//! before `state` is looked at, so an unknown version never gets
//! interpreted as a game.

use crate::state::GameState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only envelope version this crate reads or writes
pub const ENVELOPE_VERSION: i64 = 0;

/// Errors decoding a stored snapshot
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(i64),
}

/// Wire form of a persisted session value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: i64,
    pub state: EnvelopeState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeState {
    pub game: GameState,
}

/// Only the version is read in the first pass
#[derive(Deserialize)]
struct Header {
    version: i64,
    #[serde(default)]
    state: serde_json::Value,
}

impl Envelope {
    /// Wrap a game at the current version
    pub fn new(game: GameState) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            state: EnvelopeState { game },
        }
    }

    /// Serialize a game without taking ownership of it
    pub fn encode(game: &GameState) -> Result<String, EnvelopeError> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            version: i64,
            state: BorrowedState<'a>,
        }

        #[derive(Serialize)]
        struct BorrowedState<'a> {
            game: &'a GameState,
        }

        Ok(serde_json::to_string(&Borrowed {
            version: ENVELOPE_VERSION,
            state: BorrowedState { game },
        })?)
    }

    /// Decode a stored snapshot, rejecting any version other than 0
    pub fn decode(raw: &str) -> Result<Envelope, EnvelopeError> {
        let header: Header = serde_json::from_str(raw)?;
        if header.version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(header.version));
        }

        let state: EnvelopeState = serde_json::from_value(header.state)?;
        Ok(Envelope {
            version: header.version,
            state,
        })
    }

    pub fn into_game(self) -> GameState {
        self.state.game
    }
}
