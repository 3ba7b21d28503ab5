//! Parkzone HTTP server.
//!
//! Zones and spaces CRUD with a consistent available-capacity counter.

use parkzone_server::{BoxError, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,parkzone=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting parkzone");

    let config = Config::from_env();
    info!(
        bind = %format!("{}:{}", config.server.host, config.server.port),
        brokers = %config.events.brokers,
        events_enabled = config.events.enabled,
        "Configuration loaded"
    );

    parkzone_server::run(config).await
}
