//! Route table.

use crate::handlers::{health, spaces, zones};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{Router, routing::get};
use parkzone_core::storage::Storage;
use tower_http::trace::TraceLayer;

/// Build the full application router.
///
/// Spaces are served both with and without a trailing slash.
pub fn router<S: Storage + Clone>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route("/zones", get(zones::list::<S>).post(zones::create::<S>))
        .route(
            "/zones/:id",
            get(zones::get::<S>)
                .put(zones::update::<S>)
                .delete(zones::delete::<S>),
        )
        .route("/zones/:id/spaces", get(zones::spaces::<S>))
        .route("/zones/:id/occupancy", get(zones::occupancy::<S>))
        .route("/spaces", get(spaces::list::<S>).post(spaces::create::<S>))
        .route("/spaces/", get(spaces::list::<S>).post(spaces::create::<S>))
        .route(
            "/spaces/:id",
            get(spaces::get::<S>)
                .put(spaces::update::<S>)
                .delete(spaces::delete::<S>),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check::<S>))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
