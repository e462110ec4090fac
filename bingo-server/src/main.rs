//! bingo-server - Based Bingo HTTP service
//!
//! Serves the JSON API for the four-letter challenge on top of one of the
//! interchangeable stores (memory, local key-value file, SQLite).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bingo_common::config::{BingoConfig, ConfigOverrides, StoreBackend, TomlConfig};
use bingo_common::store::{InMemoryStore, LocalStateStore, SqliteStore};
use bingo_common::BingoStore;
use bingo_server::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bingo-server
#[derive(Parser, Debug)]
#[command(name = "bingo-server")]
#[command(about = "Based Bingo challenge service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host address to bind
    #[arg(long)]
    bind_host: Option<String>,

    /// Folder holding the database or local storage file
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Store backend: memory, local or sqlite
    #[arg(short, long)]
    backend: Option<StoreBackend>,

    /// Config file (defaults to ~/.config/based-bingo/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bingo_server=info,bingo_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Based Bingo (bingo-server) v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let toml = match &args.config {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TomlConfig::load_default(),
    };
    let overrides = ConfigOverrides {
        data_folder: args.data_folder,
        port: args.port,
        bind_host: args.bind_host,
        backend: args.backend,
    };
    let config = BingoConfig::resolve(&overrides, &toml).context("Invalid configuration")?;

    let store = open_store(&config).await?;
    let app = build_router(AppState::new(store));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("bingo-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn open_store(config: &BingoConfig) -> Result<Arc<dyn BingoStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store (nothing is persisted)");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Local => {
            config.ensure_data_folder()?;
            let path = config.local_state_path();
            info!("Using local storage file: {}", path.display());
            Ok(Arc::new(LocalStateStore::open(path).await))
        }
        StoreBackend::Sqlite => {
            config.ensure_data_folder()?;
            let path = config.database_path();
            info!("Database path: {}", path.display());
            let store = SqliteStore::open(&path)
                .await
                .context("Failed to open database")?;
            info!("✓ Connected to database");
            Ok(Arc::new(store))
        }
    }
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
            info!("Received terminate signal, shutting down");
        },
    }
}
