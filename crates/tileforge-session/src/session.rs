//! Session types: configuration and the state of one game.
//!
//! A [`GameState`] is everything the client sees about a game plus a move
//! counter. It is advanced only through [`GameState::apply`], which keeps
//! the status flags consistent with the board.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tileforge_board::{Board, BoardError, Direction, GamePhase, Spawned};
use tileforge_protocol::{GameId, GameSnapshot};

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session store.
///
/// Every field has a default, so a TOML `[session]` table only needs to
/// name the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Smallest accepted board dimension.
    pub min_size: usize,

    /// Largest accepted board dimension.
    pub max_size: usize,

    /// Board dimension used when a request does not name one.
    pub default_size: usize,

    /// Tile value that sets `won`.
    pub win_tile: u64,

    /// Whether a game that has `won` (but is not `over`) still accepts
    /// moves. When false such moves are rejected.
    pub continue_after_win: bool,

    /// Upper bound on live games. Creating one more fails with
    /// [`SessionError::CapacityExceeded`].
    pub max_sessions: usize,

    /// Games untouched for this many seconds are evicted. 0 disables
    /// eviction.
    pub idle_ttl_secs: u64,

    /// Number of independently locked shards in the session map.
    pub shards: usize,

    /// Seed for every game's tile generator. `None` seeds from the OS.
    /// Game `n` created by a store gets `rng_seed + n`.
    pub rng_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_size: 3,
            max_size: 6,
            default_size: 4,
            win_tile: 2048,
            continue_after_win: false,
            max_sessions: 100_000,
            idle_ttl_secs: 3600,
            shards: 32,
            rng_seed: None,
        }
    }
}

impl SessionConfig {
    /// Turns the optional size from a request into a board dimension.
    ///
    /// `None` picks `default_size`.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidSize`] if the size is outside
    /// `min_size..=max_size`.
    pub fn resolve_size(&self, requested: Option<i64>) -> Result<usize, SessionError> {
        let Some(size) = requested else {
            return Ok(self.default_size);
        };
        usize::try_from(size)
            .ok()
            .filter(|s| (self.min_size..=self.max_size).contains(s))
            .ok_or(SessionError::InvalidSize {
                size,
                min: self.min_size,
                max: self.max_size,
            })
    }

    /// The idle timeout, or `None` if eviction is disabled.
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// One game: board, score, and status flags.
///
/// Invariants kept by [`apply`](Self::apply):
/// - the board size never changes (a restart builds a new `GameState`)
/// - `score` only grows, and only by merge points
/// - `won` never goes back to false
/// - `over` is true iff no direction would move the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub id: GameId,
    pub board: Board,
    pub score: u64,
    pub won: bool,
    pub over: bool,
    /// Number of moves that changed the board.
    pub moves: u64,
}

/// What a single [`GameState::apply`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub moved: bool,
    pub score_delta: u64,
    pub spawned: Option<Spawned>,
    /// `won` flipped to true on this move.
    pub just_won: bool,
    /// `over` flipped to true on this move.
    pub just_over: bool,
}

impl GameState {
    /// Starts a game: an empty `size × size` board with two random tiles.
    ///
    /// # Errors
    /// Returns [`BoardError::InvalidSize`] if the board cannot be built.
    pub fn new<R: Rng + ?Sized>(
        id: GameId,
        size: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let mut board = Board::empty(size)?;
        board.spawn_tile(rng);
        board.spawn_tile(rng);
        let over = board.is_stuck();
        Ok(Self {
            id,
            board,
            score: 0,
            won: false,
            over,
            moves: 0,
        })
    }

    /// Wraps an existing board, e.g. one loaded for a test scenario.
    /// Flags are computed from the board as it stands.
    pub fn from_board(id: GameId, board: Board, score: u64, win_tile: u64) -> Self {
        let won = board.reaches(win_tile);
        let over = board.is_stuck();
        Self {
            id,
            board,
            score,
            won,
            over,
            moves: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// Where this game is in its lifecycle.
    pub fn phase(&self) -> GamePhase {
        GamePhase::from_flags(self.moves, self.won, self.over)
    }

    /// Slides the board, spawns a tile if anything moved, and updates
    /// score and flags.
    ///
    /// A move that changes nothing leaves board, score and `won` alone
    /// and spawns nothing. This method does not check whether the game
    /// has ended; the store enforces that policy.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        direction: Direction,
        rng: &mut R,
        win_tile: u64,
    ) -> MoveReport {
        let outcome = self.board.shift(direction);
        let was_won = self.won;
        let was_over = self.over;

        let mut spawned = None;
        if outcome.moved {
            self.board = outcome.board;
            self.score = self.score.saturating_add(outcome.score_delta);
            self.moves += 1;
            spawned = self.board.spawn_tile(rng);
            self.won = was_won || self.board.reaches(win_tile);
        }
        self.over = self.board.is_stuck();

        MoveReport {
            moved: outcome.moved,
            score_delta: outcome.score_delta,
            spawned,
            just_won: self.won && !was_won,
            just_over: self.over && !was_over,
        }
    }

    /// The response body for this game.
    pub fn to_snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id.clone(),
            size: self.size(),
            board: self.board.rows(),
            score: self.score,
            over: self.over,
            won: self.won,
        }
    }
}
