//! Runs the HTTP server until interrupted.
//!
//! Configuration is resolved from defaults, the config file and the
//! environment before any flag given here is applied on top.

use crate::{
    api::{routes, AppState},
    db::{db::Db, tasks::Tasks},
    libs::{config::Config, messages::Message},
};
use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long)]
    env: Option<String>,

    /// SQLite database path, or `:memory:`
    #[arg(long)]
    db: Option<String>,

    /// Read configuration from this JSON file instead of the data directory
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ServeArgs {
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::read_from(path)?,
            None => Config::read()?,
        };
        let mut config = config.apply_env()?;

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(env) = &self.env {
            config.env = env.clone();
        }
        if let Some(dsn) = &self.db {
            config.db.dsn = dsn.clone();
        }

        Ok(config)
    }
}

pub async fn cmd(args: ServeArgs) -> Result<()> {
    let config = args.load_config()?;

    let dsn = config.resolve_dsn()?;
    let db = Db::open(&dsn, Duration::from_millis(config.db.busy_timeout_ms))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("{}", Message::ServerStarting(addr.to_string(), config.env.clone()));

    let state = AppState {
        tasks: Tasks::new(db),
        config: Arc::new(config),
    };

    axum::serve(listener, routes(state)).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("{}", Message::ServerStopped);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("{}", Message::ShutdownSignal("SIGINT")),
        () = terminate => tracing::info!("{}", Message::ShutdownSignal("SIGTERM")),
    }
}
