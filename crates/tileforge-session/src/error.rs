//! Error types for the session layer.

use tileforge_board::{BoardError, GamePhase};
use tileforge_protocol::GameId;

/// Errors returned by [`SessionStore`](crate::SessionStore) operations.
///
/// Every variant is local to the request that caused it: a rejected
/// request never leaves a game half-updated.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The requested board size is outside the configured range.
    #[error("board size {size} is not supported (expected {min}..={max})")]
    InvalidSize { size: i64, min: usize, max: usize },

    /// No game exists with this id. It was never created, or it was
    /// evicted after sitting idle.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The game has already ended; restart it to keep playing.
    #[error("game {id} is {phase}; no further moves are accepted")]
    MoveRejected { id: GameId, phase: GamePhase },

    /// The server is holding as many games as it is allowed to.
    #[error("session limit of {0} games reached")]
    CapacityExceeded(usize),

    /// The board could not be built (configuration outside what the
    /// board supports).
    #[error(transparent)]
    Board(#[from] BoardError),
}
