//! Game state machine.
//!
//! Every operation builds the complete next [`GameState`] first and only then
//! swaps it in, so a rejected move or unparseable FEN leaves the previous
//! value untouched. Failures are logged and reported as `false` or as a
//! silent no-op; nothing here returns an error to the caller.

use crate::rules::{MoveRequest, RulesEngine, RulesError};
use crate::state::{GameState, HistoryEntry, User};
use chrono::Utc;
use tracing::{debug, warn};

/// Owns one session's game state and applies operations to it
#[derive(Debug, Clone)]
pub struct GameStateMachine<R> {
    rules: R,
    state: GameState,
}

impl<R: RulesEngine> GameStateMachine<R> {
    /// Start from the standard initial position with an empty roster
    pub fn new(rules: R) -> Self {
        Self::with_state(rules, GameState::default())
    }

    /// Start from a previously stored state
    pub fn with_state(rules: R, state: GameState) -> Self {
        Self { rules, state }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Replace the whole state, e.g. with a value fetched from the snapshot store
    pub fn replace(&mut self, state: GameState) {
        self.state = state;
    }

    /// Apply a move for the side to move. Returns `false` and leaves the
    /// state unchanged if the engine rejects it.
    pub fn apply_move(&mut self, from: &str, to: &str, promotion: Option<char>) -> bool {
        let request = MoveRequest::new(from, to, promotion);

        match self.next_after_move(&request) {
            Ok(next) => {
                debug!(mv = %request, turn = %next.turn, "Move applied");
                self.state = next;
                true
            }
            Err(e) => {
                warn!(mv = %request, error = %e, "Invalid move");
                false
            }
        }
    }

    fn next_after_move(&self, request: &MoveRequest) -> Result<GameState, RulesError> {
        let position = self.rules.parse(&self.state.fen)?;
        let applied = self.rules.validate_and_apply(&position, request)?;

        let mut history = self.state.history.clone();
        history.push(HistoryEntry {
            by: self.state.turn,
            from: request.from.clone(),
            to: request.to.clone(),
            prev_fen: self.state.fen.clone(),
            at: Utc::now(),
        });

        Ok(GameState {
            users: self.state.users.clone(),
            turn: self.state.turn.flip(),
            fen: self.rules.to_fen(&applied.position),
            history,
            status: applied.flags,
        })
    }

    /// Back to the initial position. The roster is kept.
    pub fn reset(&mut self) {
        self.state = GameState {
            users: self.state.users.clone(),
            ..GameState::default()
        };
    }

    /// Load an arbitrary position. History is cleared and the turn is
    /// flipped from the current turn, independent of the side to move
    /// encoded in `fen`.
    pub fn load(&mut self, fen: &str) {
        let position = match self.rules.parse(fen) {
            Ok(position) => position,
            Err(e) => {
                warn!(fen, error = %e, "Invalid FEN");
                return;
            }
        };

        self.state = GameState {
            users: self.state.users.clone(),
            turn: self.state.turn.flip(),
            fen: fen.to_string(),
            history: Vec::new(),
            status: self.rules.derive_flags(&position),
        };
    }

    /// Take back the last move. No-op on an empty history.
    pub fn undo(&mut self) {
        let Some(prev_fen) = self.state.history.last().map(|e| e.prev_fen.clone()) else {
            return;
        };

        let position = match self.rules.parse(&prev_fen) {
            Ok(position) => position,
            Err(e) => {
                warn!(fen = %prev_fen, error = %e, "Cannot restore position for undo");
                return;
            }
        };

        let mut history = self.state.history.clone();
        history.pop();

        self.state = GameState {
            users: self.state.users.clone(),
            turn: self.state.turn.flip(),
            fen: prev_fen,
            history,
            status: self.rules.derive_flags(&position),
        };
    }

    /// Add a user, or change the seat of an existing one
    pub fn upsert_user(&mut self, user: User) {
        let mut users = self.state.users.clone();
        users.upsert(user);
        self.state.users = users;
    }

    /// Remove a user by name. Returns whether anything changed.
    pub fn remove_user(&mut self, name: &str) -> bool {
        self.state.users.remove(name)
    }
}
