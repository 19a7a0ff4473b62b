//! Random tile placement.

use rand::Rng;

use crate::Board;

/// Chance that a freshly spawned tile is a 4 rather than a 2.
pub const FOUR_PROBABILITY: f64 = 0.1;

/// Where a spawned tile landed and what it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub row: usize,
    pub col: usize,
    pub value: u64,
}

/// Draws the value of a new tile: 2 with probability 0.9, else 4.
pub fn random_tile_value<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    if rng.random_bool(FOUR_PROBABILITY) { 4 } else { 2 }
}

impl Board {
    /// Places one new tile on an empty cell chosen uniformly at random.
    ///
    /// Returns `None` and leaves the board unchanged when it is full.
    ///
    /// ```
    /// use rand::{SeedableRng, rngs::StdRng};
    /// use tileforge_board::Board;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let mut board = Board::empty(4).unwrap();
    /// let spawned = board.spawn_tile(&mut rng).unwrap();
    /// assert!(spawned.value == 2 || spawned.value == 4);
    /// assert_eq!(board.tile_count(), 1);
    /// ```
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Spawned> {
        let empty = self.count_empty();
        if empty == 0 {
            return None;
        }
        let pick = rng.random_range(0..empty);
        let index = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == 0)
            .nth(pick)
            .map(|(i, _)| i)?;
        let value = random_tile_value(rng);
        self.cells[index] = value;
        Some(Spawned {
            row: index / self.size,
            col: index % self.size,
            value,
        })
    }

    /// Returns a copy of this board with one random tile added.
    pub fn with_random_tile<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut board = self.clone();
        board.spawn_tile(rng);
        board
    }
}
