//! Policy for combining a fetched snapshot with the local game.

use chess_session_core::GameState;

/// Decides the value committed when a snapshot is fetched
pub trait MergePolicy: Send + Sync {
    fn merge(&self, local: &GameState, remote: GameState) -> GameState;
}

/// The fetched value replaces the local one wholesale, including any local
/// moves applied since the fetch started.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastFetchWins;

impl MergePolicy for LastFetchWins {
    fn merge(&self, _local: &GameState, remote: GameState) -> GameState {
        remote
    }
}
