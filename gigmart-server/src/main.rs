//! Gigmart Server
//!
//! A service marketplace backend: clients post orders against catalog
//! services, workers take them, payment settles through a hosted payment
//! provider, and listeners are notified live over WebSocket.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use gigmart_core::payment::StripeOracle;
use gigmart_core::entities::service_listings::ServiceListing;
use gigmart_core::store::{MemoryStore, OrderStore, PgStore, ServiceCatalog};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Gigmart - service marketplace order server
#[derive(Parser, Debug)]
#[command(name = "gigmart-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./gigmart-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting gigmart-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader
        .load()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to load configuration"))?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let (shared_config, catalog) = loaded_config.into_shared();

    let stores = open_stores(catalog).await?;

    let oracle = Arc::new(StripeOracle::new(shared_config.payment.clone()));

    // Create application state
    let state = AppState::new(
        shared_config.clone(),
        stores.orders,
        stores.catalog,
        oracle,
    );

    let reload_handle = spawn_config_reload_handler(shared_config, config_loader);

    let result = run_server(build_router(state), listen_addr).await;

    drop(reload_handle);

    if let Some(pool) = stores.pool {
        tracing::info!("Closing database connections...");
        pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// The record store the server runs on.
struct Stores {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ServiceCatalog>,
    /// Held so it can be closed on shutdown.
    pool: Option<PgPool>,
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store
/// seeded with the `[[catalog]]` entries.
async fn open_stores(catalog: Vec<ServiceListing>) -> anyhow::Result<Stores> {
    let Some(database_url) = get_database_url() else {
        tracing::warn!(
            listings = catalog.len(),
            "DATABASE_URL not set, using in-memory store; orders are lost on exit"
        );
        let store = Arc::new(MemoryStore::with_services(catalog));
        return Ok(Stores {
            orders: store.clone(),
            catalog: store,
            pool: None,
        });
    };

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to connect to database"))?;
    if !catalog.is_empty() {
        tracing::info!("Ignoring [[catalog]] entries; listings come from the database");
    }
    let store = Arc::new(PgStore::new(pool.clone()));
    Ok(Stores {
        orders: store.clone(),
        catalog: store,
        pool: Some(pool),
    })
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
