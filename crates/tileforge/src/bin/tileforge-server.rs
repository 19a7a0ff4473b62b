use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tileforge::prelude::*;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tileforge-server", version, about = "HTTP server for 2048 games")]
struct Args {
    /// Path to a TOML config file. Missing keys use built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host interface to bind, overriding the config file.
    #[arg(long)]
    host: Option<IpAddr>,
    /// Port to bind, overriding the config file.
    #[arg(long)]
    port: Option<u16>,
    /// Tracing filter, e.g. "info", "tileforge_session=debug".
    /// Falls back to RUST_LOG, then to the config file.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_toml(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.bind.set_ip(host);
    }
    if let Some(port) = args.port {
        config.bind.set_port(port);
    }

    let filter = match &args.log {
        Some(directives) => EnvFilter::try_new(directives).context("invalid --log filter")?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log))
            .context("invalid log filter in config")?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = TileforgeServer::builder()
        .config(&config)
        .build()
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(listening = %server.local_addr()?, "ready");

    server.run_until(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
