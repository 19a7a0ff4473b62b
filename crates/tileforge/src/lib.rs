//! # Tileforge
//!
//! HTTP game server for sliding-tile 2048 games.
//!
//! The server is authoritative: clients only send directions, and every
//! slide, merge, tile spawn and status check happens here. Each game lives
//! in memory under an opaque id until it is restarted or evicted.
//!
//! ## Routes
//!
//! | Method | Path                       | Body                    |
//! |--------|----------------------------|-------------------------|
//! | POST   | `/api/game`                | `{"size": n}` (optional) |
//! | GET    | `/api/game/:id`            |                         |
//! | POST   | `/api/game/:id/move`       | `{"direction": "UP"}`   |
//! | POST   | `/api/game/:id/restart`    | `{"size": n}` (optional) |
//! | GET    | `/healthz`                 |                         |
//!
//! Every game route answers with a [`GameSnapshot`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tileforge::prelude::*;
//!
//! # async fn start() -> Result<(), TileforgeError> {
//! let server = TileforgeServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::TileforgeError;
pub use server::{TileforgeServer, TileforgeServerBuilder};

/// Everything needed to embed or drive a Tileforge server.
pub mod prelude {
    pub use crate::{ServerConfig, TileforgeError, TileforgeServer, TileforgeServerBuilder};
    pub use tileforge_board::{Board, GamePhase};
    pub use tileforge_protocol::{
        Codec, Direction, GameId, GameSnapshot, JsonCodec, MoveRequest, NewGameRequest,
        ProtocolError, RestartRequest,
    };
    pub use tileforge_session::{GameState, SessionConfig, SessionError, SessionStore};
}
