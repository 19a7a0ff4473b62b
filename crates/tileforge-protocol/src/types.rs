//! Core protocol types for Tileforge's HTTP API.
//!
//! Every type here either arrives in a request body or leaves in a
//! response body. Field names are part of the contract with the browser
//! client and must not change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Longest id accepted from a client (a UUID is 36 bytes).
const MAX_ID_LEN: usize = 64;

/// Opaque identifier of one game session.
///
/// Server-assigned ids are UUID v4 strings. Clients may also name a
/// session themselves through `restart`, so ids arriving from the outside
/// go through [`GameId::parse`].
///
/// `#[serde(transparent)]` makes `GameId("abc")` serialize as `"abc"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Allocates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Validates a client-supplied id.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidId`] if the id is empty, longer
    /// than 64 bytes, or contains anything but ASCII alphanumerics,
    /// `-` and `_`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ProtocolError::InvalidId(raw.to_string()))
        }
    }

    /// Borrows the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The four ways a player can slide the board.
///
/// On the wire these are the upper-case tokens `"UP"`, `"DOWN"`,
/// `"LEFT"` and `"RIGHT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Every direction, in a fixed order.
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// The wire token for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a wire token. Matching is case-insensitive, so `"left"` and
/// `"Left"` are accepted alongside `"LEFT"`.
impl FromStr for Direction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dir| dir.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::InvalidDirection(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /api/game` and `POST /api/game/{id}/restart`.
///
/// The whole body is optional; a missing body or a missing `size` means
/// "use the server's default board size".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameRequest {
    #[serde(default)]
    pub size: Option<i64>,
}

/// Restart takes the same body as create.
pub type RestartRequest = NewGameRequest;

/// Body of `POST /api/game/{id}/move`.
///
/// `direction` is kept as a raw string so that an unknown token is
/// reported as an invalid direction rather than a generic decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub direction: String,
}

impl MoveRequest {
    /// Parses the direction token.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidDirection`] for unknown tokens.
    pub fn direction(&self) -> Result<Direction, ProtocolError> {
        self.direction.parse()
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The game state as the client sees it.
///
/// Serializes to `{id, size, board, score, over, won}` where `board` is
/// `size` rows of `size` integers, row-major, `0` meaning an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub size: usize,
    pub board: Vec<Vec<u64>>,
    pub score: u64,
    pub over: bool,
    pub won: bool,
}
