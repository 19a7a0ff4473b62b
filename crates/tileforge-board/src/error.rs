//! Error types for the board layer.

/// Errors raised while building a [`Board`](crate::Board).
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The requested dimension is zero or larger than [`Board::MAX_SIZE`](crate::Board::MAX_SIZE).
    #[error("board size {0} is out of range")]
    InvalidSize(usize),

    /// A row's length differs from the number of rows.
    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// A cell holds something other than 0 or a power of two.
    #[error("cell ({row}, {col}) holds {value}, which is not a tile value")]
    InvalidTile { row: usize, col: usize, value: u64 },
}
