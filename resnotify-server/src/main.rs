//! Reservation Notification Service
//!
//! Consumes reservation events from RabbitMQ, stores a notification for each
//! one, and serves them over an HTTP query API.

mod api;
mod config;
mod consumer;
mod server;
mod shutdown;
mod state;
mod store;

use clap::Parser;
use config::{Args, ConfigLoader};
use consumer::spawn_consumer;
use resnotify_core::processors::ConsumerState;
use resnotify_core::store::InMemoryNotificationStore;
use server::{build_router, run_server};
use state::AppState;
use store::StoreBackend;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Connections held by the HTTP server's pool.
const API_POOL_SIZE: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting resnotify-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ConfigLoader::new(args).load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!(
        profile = ?config.profile,
        queue = %config.broker.queue,
        dead_letter_queue = %config.broker.dead_letter_queue,
        "Configuration loaded"
    );

    let backend = if config.memory_store {
        tracing::warn!("Using in-memory store, notifications will not survive a restart");
        StoreBackend::Memory(InMemoryNotificationStore::new())
    } else {
        StoreBackend::Postgres {
            url: config.database_url.clone(),
        }
    };

    let api_store = backend.open(API_POOL_SIZE).map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        e
    })?;

    // Run migrations if requested
    if config.migrate {
        match &api_store.pool {
            Some(pool) => {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("../migrations").run(pool).await.map_err(|e| {
                    tracing::error!("Failed to run migrations: {}", e);
                    e
                })?;
                tracing::info!("Migrations completed successfully");
            }
            None => tracing::warn!("--migrate has no effect with the in-memory store"),
        }
    }

    // Start the consumer on its own thread
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (state_tx, state_rx) = watch::channel(ConsumerState::Disconnected);
    let consumer_thread = spawn_consumer(
        backend,
        config.broker.clone(),
        config.consumer.clone(),
        state_tx,
        shutdown_rx,
    )
    .map_err(|e| {
        tracing::error!("Failed to spawn consumer thread: {}", e);
        e
    })?;

    // Build the router
    let router = build_router(AppState::new(api_store.store.clone(), state_rx));

    // Run the server
    tracing::info!("Starting HTTP server on {}", config.listen);
    let result = run_server(router, config.listen).await;

    // Stop the consumer and wait for it to settle its in-flight delivery
    tracing::info!("Stopping consumer...");
    shutdown_tx.send_replace(true);
    match tokio::task::spawn_blocking(move || consumer_thread.join()).await {
        Ok(Ok(())) => tracing::info!("Consumer stopped"),
        Ok(Err(_)) => tracing::error!("Consumer thread panicked"),
        Err(e) => tracing::error!("Failed to join consumer thread: {}", e),
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    api_store.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,lapin=warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
