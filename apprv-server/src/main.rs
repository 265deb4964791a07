//! Apprv Server
//!
//! Approval events with a deadline, decided by Slack interactive buttons.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use apprv_core::framework::StoreProcessor;
use apprv_core::id::SystemEntropy;
use apprv_core::processors::{
    CallbackDispatcher, CallbackProcessor, DefaultResultFormatter, HttpNotifier,
};
use apprv_core::queue::callback_channel_with_capacity;
use apprv_core::store::{MemoryKeyValueStore, PgKeyValueStore, SharedStore};
use clap::Parser;
use config::runtime::{StoreBackend, StoreConfig};
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How long queued callbacks get to finish after the HTTP server stops.
const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Apprv - approval events decided through Slack buttons
#[derive(Parser, Debug)]
#[command(name = "apprv-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./apprv-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting apprv-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let (store, db_pool) = connect_store(&loaded_config.store, args.migrate).await?;

    // Background callback processing
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (callback_tx, callback_rx) =
        callback_channel_with_capacity(loaded_config.worker.queue_capacity);
    let processor = Arc::new(CallbackProcessor::new(
        StoreProcessor::new(store.clone()),
        Arc::new(HttpNotifier::new()),
        Arc::new(DefaultResultFormatter),
    ));
    let mut dispatcher =
        tokio::spawn(CallbackDispatcher::new(processor).run(shutdown_rx, callback_rx));

    let state = AppState::new(
        store,
        Arc::new(SystemEntropy::new()),
        callback_tx,
        loaded_config.slack,
    );

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Dropping the last sender lets the dispatcher drain and exit on its own.
    reload_notify.notify_one();
    tracing::info!("Waiting for queued callbacks...");
    match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, &mut dispatcher).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Callback dispatcher panicked"),
        Err(_) => {
            tracing::warn!("Callback queue did not drain in time, stopping dispatcher");
            if shutdown_tx.send(true).is_err() {
                tracing::debug!("Callback dispatcher already stopped");
            }
            match dispatcher.await {
                Ok(dropped) if dropped > 0 => {
                    tracing::warn!(dropped, "Queued callbacks were discarded");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Callback dispatcher panicked"),
            }
        }
    }

    if let Some(pool) = db_pool {
        tracing::info!("Closing database connections...");
        pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Open the configured event store.
///
/// Returns the pool alongside the store when the backend is Postgres so it
/// can be closed on shutdown.
async fn connect_store(
    config: &StoreConfig,
    migrate: bool,
) -> anyhow::Result<(SharedStore, Option<PgPool>)> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, events are lost on restart");
            Ok((Arc::new(MemoryKeyValueStore::new()), None))
        }
        StoreBackend::Postgres => {
            let database_url = get_database_url().map_err(|e| {
                tracing::error!("DATABASE_URL environment variable not set");
                e
            })?;

            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(config.idle_timeout)
                .test_before_acquire(true)
                .connect(&database_url)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to database: {}", e);
                    e
                })?;
            tracing::info!("Database connection established");

            if migrate {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("../migrations")
                    .run(&db_pool)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to run migrations: {}", e);
                        e
                    })?;
                tracing::info!("Migrations completed successfully");
            }

            let store: SharedStore = Arc::new(PgKeyValueStore::new(db_pool.clone()));
            Ok((store, Some(db_pool)))
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
