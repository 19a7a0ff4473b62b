//! Game sessions for Tileforge.
//!
//! This crate owns every live game on the server:
//!
//! 1. **Game state** — board, score, and the sticky `won` / recomputed
//!    `over` flags of one game ([`GameState`])
//! 2. **Session storage** — the concurrent map of games keyed by id,
//!    with per-game exclusive access ([`SessionStore`])
//! 3. **Limits** — supported board sizes, capacity, and idle eviction
//!    ([`SessionConfig`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)   ← HTTP handlers call create / apply_move / restart
//!     ↕
//! Session Layer (this crate)   ← one lock per game, no global lock
//!     ↕
//! Board Layer (below)   ← pure slide/merge/spawn over a single grid
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionStore;
pub use session::{GameState, MoveReport, SessionConfig};
