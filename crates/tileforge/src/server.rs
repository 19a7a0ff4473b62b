//! `TileforgeServer` builder and server loop.
//!
//! This is the entry point for running a Tileforge game server. It ties
//! the layers together: HTTP → protocol → session → board.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tileforge_protocol::{Codec, JsonCodec};
use tileforge_session::{SessionConfig, SessionStore};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::validate_session;
use crate::handler::{create_game, get_game, health, move_game, restart_game};
use crate::{ServerConfig, TileforgeError};

/// Shared state handed to every request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The store
/// does its own locking, so no outer mutex is needed.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) store: Arc<SessionStore>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Tileforge server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use tileforge::prelude::*;
///
/// # async fn start() -> Result<(), TileforgeError> {
/// let server = TileforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .session_config(SessionConfig { max_sessions: 10_000, ..Default::default() })
///     .sweep_interval(Duration::from_secs(30))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TileforgeServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    sweep_interval: Option<Duration>,
}

impl TileforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        let sweep_interval = defaults.sweep_interval();
        Self {
            bind_addr: defaults.bind.to_string(),
            session_config: defaults.session,
            sweep_interval,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how often idle games are swept. `Duration::ZERO` disables the
    /// sweeper.
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = (!every.is_zero()).then_some(every);
        self
    }

    /// Applies every setting from a loaded [`ServerConfig`].
    pub fn config(self, config: &ServerConfig) -> Self {
        let mut builder = self
            .bind(&config.bind.to_string())
            .session_config(config.session.clone());
        builder.sweep_interval = config.sweep_interval();
        builder
    }

    /// Validates the session limits, binds the listener and builds the
    /// server.
    ///
    /// Uses `JsonCodec` for request and response bodies.
    ///
    /// # Errors
    /// - [`TileforgeError::InvalidConfig`] — inconsistent session limits
    /// - [`TileforgeError::Io`] — the address cannot be bound
    pub async fn build(self) -> Result<TileforgeServer<JsonCodec>, TileforgeError> {
        validate_session(&self.session_config)?;
        let listener = TcpListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            store: Arc::new(SessionStore::new(self.session_config)),
            codec: JsonCodec,
        });

        Ok(TileforgeServer {
            listener,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for TileforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tileforge game server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct TileforgeServer<C: Codec> {
    listener: TcpListener,
    state: Arc<ServerState<C>>,
    sweep_interval: Option<Duration>,
}

impl TileforgeServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> TileforgeServerBuilder {
        TileforgeServerBuilder::new()
    }
}

impl<C: Codec> TileforgeServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The session store behind this server.
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.state.store)
    }

    /// Builds the route table, bound to this server's state.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/game", post(create_game::<C>))
            .route("/api/game/:id", get(get_game::<C>))
            .route("/api/game/:id/move", post(move_game::<C>))
            .route("/api/game/:id/restart", post(restart_game::<C>))
            .route("/healthz", get(health::<C>))
            .with_state(Arc::clone(&self.state))
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), TileforgeError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves requests until `shutdown` completes, then lets in-flight
    /// requests finish and returns.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), TileforgeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let store = Arc::clone(&self.state.store);

        let sweeper = match (store.config().idle_ttl(), self.sweep_interval) {
            (Some(ttl), Some(every)) => Some(spawn_sweeper(Arc::clone(&store), ttl, every)),
            _ => None,
        };

        tracing::info!(
            addr = ?self.listener.local_addr().ok(),
            max_sessions = store.config().max_sessions,
            "Tileforge server running"
        );

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(handle) = sweeper {
            handle.abort();
        }
        tracing::info!(sessions = store.len(), "Tileforge server stopped");
        result.map_err(TileforgeError::from)
    }
}

/// Evicts idle games every `every` until aborted.
fn spawn_sweeper(store: Arc<SessionStore>, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = store.evict_idle(ttl);
            tracing::debug!(evicted = evicted.len(), live = store.len(), "idle sweep");
        }
    })
}
