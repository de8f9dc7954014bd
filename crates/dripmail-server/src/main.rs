//! Dripmail - outbound-messaging engine entry point

use anyhow::Result;
use dripmail_api::create_router;
use dripmail_common::config::{Config, LoggingConfig};
use dripmail_storage::db::DatabasePool;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    init_logging(&config.logging);

    info!("Starting Dripmail server...");

    if config.vault.is_default_secret() {
        warn!("Vault secret is the development default; override it in production");
    }

    // Initialize database
    let db_pool = DatabasePool::new(&config.database).await?;

    // Run migrations
    db_pool.migrate().await?;

    // Build and serve the API
    let app = create_router(db_pool, &config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!("API listening on {}", config.server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing
///
/// RUST_LOG takes precedence over the configured filter.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
