//! Win/loss detection and the game phase state machine.

use serde::{Deserialize, Serialize};

use crate::Board;

impl Board {
    /// Returns `true` if at least one direction would change the board:
    /// there is an empty cell, or two horizontally/vertically adjacent
    /// cells hold the same value.
    pub fn has_moves(&self) -> bool {
        if self.cells.contains(&0) {
            return true;
        }
        let n = self.size;
        (0..n).any(|row| {
            (0..n).any(|col| {
                let value = self.cells[row * n + col];
                (col + 1 < n && self.cells[row * n + col + 1] == value)
                    || (row + 1 < n && self.cells[(row + 1) * n + col] == value)
            })
        })
    }

    /// Returns `true` if no move in any direction changes the board.
    pub fn is_stuck(&self) -> bool {
        !self.has_moves()
    }

    /// Returns `true` if some tile is at least `tile`.
    pub fn reaches(&self, tile: u64) -> bool {
        self.max_tile() >= tile
    }
}

/// The lifecycle of one game, derived from its status flags.
///
/// ```text
/// Created ──(first move)──→ InProgress ──→ Won
///                               │           │
///                               └─────→ Over ←┘
/// ```
///
/// `won` and `over` are independent flags; when both hold the phase is
/// `Over`, since nothing more can happen. A restart always goes back to
/// `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Created,
    InProgress,
    Won,
    Over,
}

impl GamePhase {
    /// Derives the phase from a game's move count and flags.
    pub fn from_flags(moves: u64, won: bool, over: bool) -> Self {
        if over {
            Self::Over
        } else if won {
            Self::Won
        } else if moves == 0 {
            Self::Created
        } else {
            Self::InProgress
        }
    }

    /// Returns `true` if a move request may be applied in this phase.
    ///
    /// `Over` never accepts moves. `Won` accepts them only when the
    /// server is configured to let players keep going past the win tile.
    pub fn accepts_moves(self, continue_after_win: bool) -> bool {
        match self {
            Self::Created | Self::InProgress => true,
            Self::Won => continue_after_win,
            Self::Over => false,
        }
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Won => write!(f, "Won"),
            Self::Over => write!(f, "Over"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    fn board(rows: Vec<Vec<u64>>) -> Board {
        Board::from_rows(rows).expect("valid board")
    }

    #[test]
    fn test_has_moves_with_empty_cell() {
        let b = board(vec![vec![2, 4], vec![8, 0]]);
        assert!(b.has_moves());
    }

    #[test]
    fn test_has_moves_full_with_horizontal_pair() {
        let b = board(vec![vec![2, 2], vec![4, 8]]);
        assert!(b.has_moves());
    }

    #[test]
    fn test_has_moves_full_with_vertical_pair() {
        let b = board(vec![vec![2, 4], vec![2, 8]]);
        assert!(b.has_moves());
    }

    #[test]
    fn test_is_stuck_checkerboard_full_board() {
        let b = board(vec![
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ]);
        assert!(b.is_stuck());
        for dir in Direction::ALL {
            let out = b.shift(dir);
            assert!(!out.moved, "{dir} should not move a stuck board");
            assert_eq!(out.board, b);
            assert_eq!(out.score_delta, 0);
        }
    }

    #[test]
    fn test_is_stuck_diagonal_equal_values_do_not_count() {
        let b = board(vec![vec![2, 4], vec![4, 2]]);
        assert!(b.is_stuck());
    }

    #[test]
    fn test_reaches_compares_against_max_tile() {
        let b = board(vec![vec![2048, 0], vec![0, 0]]);
        assert!(b.reaches(2048));
        assert!(!b.reaches(4096));
        let b = board(vec![vec![4096, 0], vec![0, 0]]);
        assert!(b.reaches(2048));
    }

    #[test]
    fn test_game_phase_from_flags() {
        assert_eq!(GamePhase::from_flags(0, false, false), GamePhase::Created);
        assert_eq!(GamePhase::from_flags(3, false, false), GamePhase::InProgress);
        assert_eq!(GamePhase::from_flags(3, true, false), GamePhase::Won);
        assert_eq!(GamePhase::from_flags(3, false, true), GamePhase::Over);
        assert_eq!(GamePhase::from_flags(3, true, true), GamePhase::Over);
    }

    #[test]
    fn test_game_phase_accepts_moves() {
        assert!(GamePhase::Created.accepts_moves(false));
        assert!(GamePhase::InProgress.accepts_moves(false));
        assert!(!GamePhase::Won.accepts_moves(false));
        assert!(GamePhase::Won.accepts_moves(true));
        assert!(!GamePhase::Over.accepts_moves(true));
    }

    #[test]
    fn test_game_phase_display() {
        assert_eq!(GamePhase::InProgress.to_string(), "InProgress");
        assert_eq!(GamePhase::Over.to_string(), "Over");
    }
}
