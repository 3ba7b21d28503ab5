//! Bootstrap and lifecycle.
//!
//! 1. Connect the pool and apply migrations.
//! 2. Pick the notification publisher.
//! 3. Install the Prometheus recorder and serve `/metrics` on its own port.
//! 4. Serve the API until Ctrl+C or SIGTERM, then drain within the
//!    configured shutdown budget.

use crate::config::Config;
use axum::{Router, routing::get};
use parkzone_core::environment::SystemClock;
use parkzone_core::events::{EventPublisher, TracingPublisher};
use parkzone_postgres::{PoolSettings, PostgresStorage};
use parkzone_redpanda::RedpandaPublisher;
use parkzone_runtime::metrics::MetricsServer;
use parkzone_runtime::{ServiceContext, ServiceSettings};
use parkzone_web::{AppState, router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Boxed error used at the binary boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Build every component from `config` and serve until shutdown.
///
/// # Errors
///
/// Returns error if the database, publisher, metrics recorder or listeners
/// cannot be set up, or if the HTTP server fails.
pub async fn run(config: Config) -> Result<(), BoxError> {
    let bind_addr = config.bind_addr()?;
    let metrics_addr = config.metrics_addr()?;

    info!("Connecting to database...");
    let storage = PostgresStorage::connect(
        &config.database.url,
        &PoolSettings {
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            acquire_timeout: Duration::from_secs(config.database.connect_timeout),
        },
    )
    .await?;
    storage.migrate().await?;

    let publisher = build_publisher(&config)?;
    let ctx = ServiceContext::new(
        publisher,
        Arc::new(SystemClock),
        ServiceSettings {
            deadline: config.request_timeout(),
            source: config.events.source.clone(),
        },
    );

    let mut metrics = MetricsServer::new(metrics_addr);
    metrics.start()?;
    let metrics_task = spawn_metrics_listener(&metrics).await?;

    let app = router(AppState::new(storage, &ctx));
    let listener = TcpListener::bind(bind_addr).await?;
    info!(address = %bind_addr, deadline_ms = config.server.request_timeout_ms, "HTTP server listening");

    serve(listener, app, config.shutdown_timeout()).await?;

    if let Some(task) = metrics_task {
        task.abort();
    }
    info!("Graceful shutdown complete");
    Ok(())
}

fn build_publisher(config: &Config) -> Result<Arc<dyn EventPublisher>, BoxError> {
    if !config.events.enabled {
        info!("Event publishing disabled, notifications will only be logged");
        return Ok(Arc::new(TracingPublisher));
    }

    let publisher = RedpandaPublisher::builder()
        .brokers(&config.events.brokers)
        .topic(&config.events.exchange)
        .routing_key(&config.events.routing_key)
        .build()?;
    Ok(Arc::new(publisher))
}

async fn spawn_metrics_listener(
    metrics: &MetricsServer,
) -> Result<Option<tokio::task::JoinHandle<()>>, BoxError> {
    let Some(handle) = metrics.handle().cloned() else {
        warn!("Metrics recorder owned elsewhere, /metrics not served");
        return Ok(None);
    };

    let app = Router::new().route("/metrics", get(move || async move { handle.render() }));
    let listener = TcpListener::bind(metrics.addr()).await?;
    info!(address = %metrics.addr(), "Metrics endpoint listening");

    Ok(Some(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics server failed");
        }
    })))
}

async fn serve(listener: TcpListener, app: Router, drain: Duration) -> Result<(), BoxError> {
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(drain, server).await {
        Ok(result) => result??,
        Err(_) => warn!(timeout_secs = drain.as_secs(), "Shutdown timed out, dropping open connections"),
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
