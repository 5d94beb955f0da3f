//! Game state value shared by every viewer of a session.
//!
//! The serialized form of [`GameState`] is the payload of a snapshot
//! envelope, so field names follow the stored JSON (`fen`, `prevFen`,
//! `isCheck`, ...) rather than Rust conventions.

use crate::roster::Roster;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard starting position
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Side {
    /// The other side
    pub fn flip(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Display name used in the status line
    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("w"),
            Side::Black => f.write_str("b"),
        }
    }
}

/// Seat a participant takes in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
    #[serde(rename = "s")]
    Spectator,
}

impl Seat {
    /// Parse the single-letter form (`w`, `b`, `s`)
    pub fn from_code(code: &str) -> Option<Seat> {
        match code {
            "w" => Some(Seat::White),
            "b" => Some(Seat::Black),
            "s" => Some(Seat::Spectator),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Seat::White => "White",
            Seat::Black => "Black",
            Seat::Spectator => "Spectator",
        }
    }
}

/// A named participant. The name is the identity within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(rename = "turn")]
    pub seat: Seat,
}

impl User {
    pub fn new(name: impl Into<String>, seat: Seat) -> Self {
        Self {
            name: name.into(),
            seat,
        }
    }
}

/// One accepted move, with the position it was played from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Side that played the move
    pub by: Side,
    pub from: String,
    pub to: String,
    /// FEN held immediately before this move was applied
    pub prev_fen: String,
    pub at: DateTime<Utc>,
}

/// Terminal and check flags derived from a position by the rules engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFlags {
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    /// Always `is_checkmate || is_stalemate || is_draw`
    pub is_game_over: bool,
}

impl StatusFlags {
    pub fn new(is_check: bool, is_checkmate: bool, is_stalemate: bool, is_draw: bool) -> Self {
        Self {
            is_check,
            is_checkmate,
            is_stalemate,
            is_draw,
            is_game_over: is_checkmate || is_stalemate || is_draw,
        }
    }
}

/// The complete session value: board, history, flags and roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub users: Roster,
    pub turn: Side,
    pub fen: String,
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub status: StatusFlags,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            users: Roster::new(),
            turn: Side::White,
            fen: INITIAL_FEN.to_string(),
            history: Vec::new(),
            status: StatusFlags::default(),
        }
    }
}

impl GameState {
    /// Move number shown above the board (starts at 1)
    pub fn move_number(&self) -> usize {
        self.history.len() + 1
    }

    /// Header text, e.g. "Black's Turn. Check!"
    pub fn status_line(&self) -> String {
        let mut line = format!("{}'s Turn", self.turn.name());

        if self.status.is_game_over {
            if self.status.is_checkmate {
                line.push_str(". Checkmate!");
            }
            if self.status.is_stalemate {
                line.push_str(". Stalemate!");
            }
            if self.status.is_draw {
                line.push_str(". Draw!");
            }
        } else if self.status.is_check {
            line.push_str(". Check!");
        }

        line
    }
}
