//! artistalbum-bandas - Bands REST service
//!
//! Serves `/v1/bandas` over a SQLite database and streams change
//! notifications on `/v1/updates`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use artistalbum_common::config::{load_toml_config, CliOverrides, ServiceConfig};
use artistalbum_common::db::init_database;
use artistalbum_common::events::EventBus;
use artistalbum_bandas::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for artistalbum-bandas
#[derive(Parser, Debug)]
#[command(name = "artistalbum-bandas")]
#[command(about = "Bands REST service for the artist/album backend")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "ARTISTALBUM_PORT")]
    port: Option<u16>,

    /// Host/IP to bind
    #[arg(short, long, env = "ARTISTALBUM_BIND")]
    bind: Option<String>,

    /// Folder holding the database file
    #[arg(short, long, env = "ARTISTALBUM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: platform config dir)
    #[arg(short, long, env = "ARTISTALBUM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artistalbum_bandas=debug,artistalbum_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting artistalbum-bandas v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_config =
        load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServiceConfig::resolve(
        CliOverrides {
            root_folder: args.root_folder,
            port: args.port,
            bind: args.bind,
        },
        file_config,
    );

    info!("Root folder: {}", config.root_folder.display());

    let db_path = config.database_path();
    let pool = init_database(&db_path, &config.database)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let event_bus = EventBus::new(config.event_capacity);
    let state = AppState::new(pool, event_bus);
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("artistalbum-bandas listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
