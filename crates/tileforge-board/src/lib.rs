//! The 2048 board for Tileforge.
//!
//! Everything in this crate is pure and synchronous: a [`Board`] goes in,
//! a new [`Board`] comes out. Randomness is always passed in by the
//! caller, so a seeded RNG reproduces a game exactly.
//!
//! # Key types
//!
//! - [`Board`] — a square grid of tiles (0 = empty, otherwise a power of two)
//! - [`MoveOutcome`] — result of sliding the board in one [`Direction`]
//! - [`Spawned`] — where a new random tile landed
//! - [`GamePhase`] — lifecycle of a game derived from its status flags

mod board;
mod engine;
mod error;
mod spawn;
mod status;

pub use board::Board;
pub use engine::MoveOutcome;
pub use error::BoardError;
pub use spawn::{FOUR_PROBABILITY, Spawned, random_tile_value};
pub use status::GamePhase;
pub use tileforge_protocol::Direction;
