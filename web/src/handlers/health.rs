//! Health check endpoints.
//!
//! Used by load balancers and orchestrators to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use parkzone_core::storage::Storage;
use serde::Serialize;

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"ok"`, `"ready"` or `"unavailable"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Liveness check.
///
/// Returns 200 OK while the process is running. Dependencies are not checked.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Readiness check: pings the storage backend.
///
/// # Status Codes
///
/// - 200 OK: storage reachable
/// - 503 Service Unavailable: storage ping failed
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness_check<S: Storage + Clone>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        },
    }
}
