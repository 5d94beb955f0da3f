//! Rules capability consumed by the state machine.
//!
//! The state machine only ever stores FEN strings. A [`RulesEngine`] turns a
//! FEN into its own position type, validates and applies moves on it, and
//! reports the status flags of a position. [`StandardChess`] is the default
//! engine, backed by `shakmaty`.

use crate::state::StatusFlags;
use shakmaty::fen::Fen;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Move, Position, PositionError, Role, Square,
};
use std::fmt;
use thiserror::Error;

/// Halfmove clock value at which the fifty-move rule applies
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Errors reported by a rules engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(char),

    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// A proposed move in coordinate form, e.g. `e7` → `e8` promoting to `q`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<char>,
}

impl MoveRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>, promotion: Option<char>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion,
        }
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece)?;
        }
        Ok(())
    }
}

/// Result of a legal move
#[derive(Debug, Clone)]
pub struct Applied<P> {
    pub position: P,
    pub flags: StatusFlags,
}

/// Move validation and position status.
///
/// Implementations must be pure: the same inputs always give the same
/// result and no state is shared between calls.
pub trait RulesEngine {
    type Position: Clone;

    /// Parse a FEN string
    fn parse(&self, fen: &str) -> Result<Self::Position, RulesError>;

    /// Serialize a position back to FEN
    fn to_fen(&self, position: &Self::Position) -> String;

    /// Status flags of a position
    fn derive_flags(&self, position: &Self::Position) -> StatusFlags;

    /// Validate a move against a position and apply it
    fn validate_and_apply(
        &self,
        position: &Self::Position,
        request: &MoveRequest,
    ) -> Result<Applied<Self::Position>, RulesError>;
}

/// Standard chess rules
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChess;

impl StandardChess {
    pub fn new() -> Self {
        Self
    }
}

/// Square the moving piece lands on. Castling is addressed by the king's
/// destination (`e1` → `g1`), not the rook square.
fn destination(m: &Move, color: Color) -> Square {
    match m.castling_side() {
        Some(side) => side.king_to(color),
        None => m.to(),
    }
}

fn parse_square(s: &str) -> Result<Square, RulesError> {
    s.parse::<Square>()
        .map_err(|_| RulesError::InvalidSquare(s.to_string()))
}

impl RulesEngine for StandardChess {
    type Position = Chess;

    fn parse(&self, fen: &str) -> Result<Chess, RulesError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| RulesError::InvalidPosition(e.to_string()))?;

        // Only reject positions that cannot be played on
        parsed
            .into_position(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .or_else(PositionError::ignore_impossible_check)
            .or_else(PositionError::ignore_too_much_material)
            .map_err(|e| RulesError::InvalidPosition(e.to_string()))
    }

    fn to_fen(&self, position: &Chess) -> String {
        Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
    }

    fn derive_flags(&self, position: &Chess) -> StatusFlags {
        let stalemate = position.is_stalemate();
        let draw = stalemate
            || position.is_insufficient_material()
            || position.halfmoves() >= FIFTY_MOVE_HALFMOVES;

        StatusFlags::new(position.is_check(), position.is_checkmate(), stalemate, draw)
    }

    fn validate_and_apply(
        &self,
        position: &Chess,
        request: &MoveRequest,
    ) -> Result<Applied<Chess>, RulesError> {
        let from = parse_square(&request.from)?;
        let to = parse_square(&request.to)?;
        let promotion = match request.promotion {
            Some(piece) => Some(
                Role::from_char(piece.to_ascii_lowercase())
                    .ok_or(RulesError::InvalidPromotion(piece))?,
            ),
            None => None,
        };

        let color = position.turn();
        let chosen = position
            .legal_moves()
            .into_iter()
            .find(|m| {
                m.from() == Some(from)
                    && destination(m, color) == to
                    && (m.promotion().is_none() || m.promotion() == promotion)
            })
            .ok_or_else(|| RulesError::IllegalMove(request.to_string()))?;

        let next = position
            .clone()
            .play(&chosen)
            .map_err(|e| RulesError::IllegalMove(e.to_string()))?;
        let flags = self.derive_flags(&next);

        Ok(Applied {
            position: next,
            flags,
        })
    }
}
