//! Film Server - Main entry point

use anyhow::Result;
use clap::Parser;
use film_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use film_server::{
    api,
    config::{Config, StoreBackend},
    storage::config::StorageConfig,
};

const DEFAULT_LOG_FILTER: &str = "film_server=debug,tower_http=debug,sqlx=info";

/// Film catalog server
#[derive(Debug, Parser)]
#[command(name = "film-server", version, about)]
struct Args {
    /// Storage backend, overriding FILM_STORE_BACKEND
    #[arg(long, value_parser = parse_backend)]
    store: Option<StoreBackend>,

    /// Load the demo films into the in-memory store
    #[arg(long)]
    seed: bool,
}

fn parse_backend(value: &str) -> Result<StoreBackend, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut log_config = LogConfig::from_env()?;
    if log_config.filter_directives.is_none() {
        log_config.filter_directives = Some(DEFAULT_LOG_FILTER.to_string());
    }
    let _log_guard = init_logging(&log_config)?;

    info!("Starting Film Server");

    // Load configuration
    let mut config = Config::load()?;
    if let Some(store) = args.store {
        config.server.store_backend = store;
    }
    info!(
        backend = %config.server.store_backend,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let state = api::build_state(&config, StorageConfig::from_env(), args.seed).await?;

    // Build the application router
    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
