//! Request handlers: decode, call the session store, encode.
//!
//! Each handler follows the same flow:
//!   1. Validate the path id → `GameId`
//!   2. Decode the body through the server's [`Codec`]
//!   3. Run one [`SessionStore`](tileforge_session::SessionStore) operation
//!   4. Encode the resulting [`GameSnapshot`](tileforge_protocol::GameSnapshot)
//!
//! Any failure short-circuits with a [`TileforgeError`], which renders
//! itself as a status code plus a plain-text message.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tileforge_protocol::{Codec, GameId, MoveRequest, NewGameRequest, RestartRequest};
use tileforge_session::GameState;

use crate::TileforgeError;
use crate::server::ServerState;

type AppState<C> = State<Arc<ServerState<C>>>;

/// `GET /healthz` body.
#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    sessions: usize,
}

/// `POST /api/game`
pub(crate) async fn create_game<C: Codec>(
    State(state): AppState<C>,
    body: Bytes,
) -> Result<Response, TileforgeError> {
    let request: NewGameRequest = state.codec.decode_or_default(&body)?;
    let game = state.store.create(request.size)?;
    respond(&state.codec, &game)
}

/// `GET /api/game/:id`
pub(crate) async fn get_game<C: Codec>(
    State(state): AppState<C>,
    Path(raw_id): Path<String>,
) -> Result<Response, TileforgeError> {
    let id = GameId::parse(&raw_id)?;
    let game = state.store.get(&id)?;
    respond(&state.codec, &game)
}

/// `POST /api/game/:id/move`
///
/// The direction is validated before the game is looked up, so a bad
/// direction is a 400 even for an unknown id.
pub(crate) async fn move_game<C: Codec>(
    State(state): AppState<C>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, TileforgeError> {
    let id = GameId::parse(&raw_id)?;
    let request: MoveRequest = state.codec.decode(&body)?;
    let direction = request.direction()?;
    let game = state.store.apply_move(&id, direction)?;
    respond(&state.codec, &game)
}

/// `POST /api/game/:id/restart`
pub(crate) async fn restart_game<C: Codec>(
    State(state): AppState<C>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, TileforgeError> {
    let id = GameId::parse(&raw_id)?;
    let request: RestartRequest = state.codec.decode_or_default(&body)?;
    let game = state.store.restart(&id, request.size)?;
    respond(&state.codec, &game)
}

/// `GET /healthz`
pub(crate) async fn health<C: Codec>(
    State(state): AppState<C>,
) -> Result<Response, TileforgeError> {
    let body = state.codec.encode(&Health {
        status: "ok",
        sessions: state.store.len(),
    })?;
    Ok(([(header::CONTENT_TYPE, C::CONTENT_TYPE)], body).into_response())
}

fn respond<C: Codec>(codec: &C, game: &GameState) -> Result<Response, TileforgeError> {
    let body = codec.encode(&game.to_snapshot())?;
    Ok(([(header::CONTENT_TYPE, C::CONTENT_TYPE)], body).into_response())
}
