//! Move resolution: slide and merge.
//!
//! Every move is reduced to the same one-dimensional problem. Each row
//! (for LEFT/RIGHT) or column (for UP/DOWN) is read starting from the
//! edge the tiles travel towards, collapsed with [`slide_line`], and
//! written back through the same mapping.

use crate::{Board, Direction};

/// Result of sliding a board in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The board after sliding and merging (no new tile yet).
    pub board: Board,
    /// Sum of the values of all tiles created by merges.
    pub score_delta: u64,
    /// `true` iff at least one cell differs from the input board.
    pub moved: bool,
}

impl Board {
    /// Slides every line towards `direction`, merging equal neighbours.
    ///
    /// `self` is left untouched; the result is built in a fresh grid and
    /// returned whole.
    ///
    /// ```
    /// use tileforge_board::{Board, Direction};
    ///
    /// let board = Board::from_rows(vec![
    ///     vec![2, 2, 4, 0],
    ///     vec![0, 0, 0, 0],
    ///     vec![0, 0, 0, 0],
    ///     vec![0, 0, 0, 0],
    /// ]).unwrap();
    /// let outcome = board.shift(Direction::Left);
    /// assert_eq!(outcome.board.rows()[0], vec![4, 4, 0, 0]);
    /// assert_eq!(outcome.score_delta, 4);
    /// assert!(outcome.moved);
    /// ```
    pub fn shift(&self, direction: Direction) -> MoveOutcome {
        let size = self.size;
        let mut cells = vec![0; size * size];
        let mut score_delta = 0u64;
        let mut line = Vec::with_capacity(size);

        for index in 0..size {
            line.clear();
            line.extend(
                (0..size).map(|pos| self.cells[cell_index(direction, size, index, pos)]),
            );
            let (slid, gained) = slide_line(&line);
            score_delta = score_delta.saturating_add(gained);
            for (pos, value) in slid.into_iter().enumerate() {
                cells[cell_index(direction, size, index, pos)] = value;
            }
        }

        let board = Board { size, cells };
        let moved = board != *self;
        MoveOutcome {
            board,
            score_delta,
            moved,
        }
    }

    /// Returns `true` if sliding in `direction` would change the board.
    pub fn can_shift(&self, direction: Direction) -> bool {
        self.shift(direction).moved
    }
}

/// Maps position `pos` of line `index` to a row-major cell index.
///
/// Position 0 is always the edge the tiles move towards.
fn cell_index(direction: Direction, size: usize, index: usize, pos: usize) -> usize {
    let last = size - 1;
    let (row, col) = match direction {
        Direction::Left => (index, pos),
        Direction::Right => (index, last - pos),
        Direction::Up => (pos, index),
        Direction::Down => (last - pos, index),
    };
    row * size + col
}

/// Collapses one line towards its start.
///
/// Zeros are dropped, then adjacent equal tiles merge pairwise from the
/// start. A merged tile never merges again in the same pass, so
/// `[2, 2, 4]` becomes `[4, 4, 0]`, not `[8, 0, 0]`. Returns the padded
/// line and the points earned.
pub(crate) fn slide_line(line: &[u64]) -> (Vec<u64>, u64) {
    let tiles: Vec<u64> = line.iter().copied().filter(|v| *v != 0).collect();
    let mut out = Vec::with_capacity(line.len());
    let mut gained = 0u64;

    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            let merged = tiles[i].saturating_mul(2);
            out.push(merged);
            gained = gained.saturating_add(merged);
            i += 2;
        } else {
            out.push(tiles[i]);
            i += 1;
        }
    }

    out.resize(line.len(), 0);
    (out, gained)
}
