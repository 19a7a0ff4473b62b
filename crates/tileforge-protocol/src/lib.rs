//! Wire protocol for Tileforge.
//!
//! This crate defines the shapes that travel over HTTP between the
//! browser client and the game server:
//!
//! - **Types** ([`GameId`], [`Direction`], [`GameSnapshot`], request
//!   bodies) — what the client sends and what the server answers with.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those shapes are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding or
//!   validating client input.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about boards or sessions. It only
//! knows how to name things and how to (de)serialize them.
//!
//! ```text
//! HTTP body (bytes) → Protocol (request types) → Session (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Direction, GameId, GameSnapshot, MoveRequest, NewGameRequest,
    RestartRequest,
};
