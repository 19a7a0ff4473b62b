//! The `Board` type and its read-only accessors.

use std::fmt;

use crate::BoardError;

/// A square 2048 grid stored row-major.
///
/// Every cell is either `0` (empty) or a positive power of two. The
/// dimension is fixed at construction; moves produce a new `Board` of
/// the same size rather than mutating this one.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pub(crate) size: usize,
    pub(crate) cells: Vec<u64>,
}

impl Board {
    /// Largest supported dimension.
    pub const MAX_SIZE: usize = 16;

    /// Creates an empty `size × size` board.
    ///
    /// # Errors
    /// Returns [`BoardError::InvalidSize`] if `size` is 0 or exceeds
    /// [`Board::MAX_SIZE`].
    pub fn empty(size: usize) -> Result<Self, BoardError> {
        if size == 0 || size > Self::MAX_SIZE {
            return Err(BoardError::InvalidSize(size));
        }
        Ok(Self {
            size,
            cells: vec![0; size * size],
        })
    }

    /// Builds a board from explicit rows.
    ///
    /// ```
    /// use tileforge_board::Board;
    ///
    /// let board = Board::from_rows(vec![vec![2, 0], vec![0, 4]]).unwrap();
    /// assert_eq!(board.size(), 2);
    /// assert_eq!(board.get(1, 1), 4);
    /// ```
    ///
    /// # Errors
    /// - [`BoardError::InvalidSize`] — no rows, or too many
    /// - [`BoardError::NotSquare`] — a row of the wrong length
    /// - [`BoardError::InvalidTile`] — a cell that is neither 0 nor a power of two
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, BoardError> {
        let mut board = Self::empty(rows.len())?;
        let size = board.size;
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            for (col, value) in values.into_iter().enumerate() {
                if value != 0 && !value.is_power_of_two() {
                    return Err(BoardError::InvalidTile { row, col, value });
                }
                board.cells[row * size + col] = value;
            }
        }
        Ok(board)
    }

    /// The board dimension.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if either coordinate is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> u64 {
        assert!(row < self.size && col < self.size, "cell out of bounds");
        self.cells[row * self.size + col]
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// The grid as `size` rows of `size` values, the shape the client
    /// renders.
    pub fn rows(&self) -> Vec<Vec<u64>> {
        self.cells.chunks(self.size).map(<[u64]>::to_vec).collect()
    }

    /// Coordinates of every empty cell, row by row.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == 0)
            .map(|(i, _)| (i / self.size, i % self.size))
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|v| **v == 0).count()
    }

    /// Number of non-empty cells.
    pub fn tile_count(&self) -> usize {
        self.cells.len() - self.count_empty()
    }

    /// The largest tile on the board, or 0 if the board is empty.
    pub fn max_tile(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tiles. Sliding never changes it; only spawning does.
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().sum()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("size", &self.size)
            .field("rows", &self.rows())
            .finish()
    }
}

/// Renders the grid as aligned text, one row per line. Handy in logs and
/// failing test output.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.max_tile().max(1).to_string().len();
        for row in self.cells.chunks(self.size) {
            let line: Vec<String> = row
                .iter()
                .map(|v| match v {
                    0 => format!("{:>width$}", "."),
                    v => format!("{v:>width$}"),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
