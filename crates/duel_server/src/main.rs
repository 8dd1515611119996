//! Duel Server - unified CLI
//!
//! Serves the session engine over HTTP, or prepares its database.

#![warn(missing_docs)]

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use duel_server::{
    Engine, MemoryStore, ServerConfig, SessionStore, SqliteStore, StoreBackend, router,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            db_path,
            store,
            config,
        } => {
            let mut settings = load_config(config)?;
            settings.override_with(host, port, db_path, store);
            run_server(settings).await
        }
        Command::Migrate { db_path } => run_migrations(db_path),
    }
}

/// Reads the config file if one was given, otherwise uses defaults.
#[instrument]
fn load_config(path: Option<PathBuf>) -> Result<ServerConfig> {
    match path {
        Some(path) => Ok(ServerConfig::from_file(path)?),
        None => Ok(ServerConfig::default()),
    }
}

/// Run the HTTP game server
#[instrument(skip(config), fields(store = %config.store()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    match config.store() {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(config.db_path(), *config.busy_timeout_ms())?;
            serve(store, &config).await
        }
        StoreBackend::Memory => serve(MemoryStore::new(), &config).await,
    }
}

async fn serve<S: SessionStore + 'static>(store: S, config: &ServerConfig) -> Result<()> {
    let engine = Arc::new(Engine::new(store, config.engine().clone()));
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!(
        host = %config.host(),
        port = config.port(),
        "Server ready at http://{}:{}/",
        config.host(),
        config.port()
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Apply pending migrations
#[instrument]
fn run_migrations(db_path: String) -> Result<()> {
    let store = SqliteStore::open(&db_path, duel_server::DEFAULT_BUSY_TIMEOUT_MS)?;
    info!(path = %store.db_path(), "Database is up to date");
    Ok(())
}
