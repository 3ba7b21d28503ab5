//! `/api/zones` handlers.

use crate::dto::{SpaceResponse, ZoneResponse};
use crate::WebResult;
use crate::extractors::{IdPath, ValidJson};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use parkzone_core::ZoneRequest;
use parkzone_core::capacity::ZoneOccupancy;
use parkzone_core::storage::Storage;
use parkzone_core::zone::ZoneId;

/// `POST /api/zones` → 201 + zone.
///
/// # Errors
///
/// 400 on validation failure, 409 on a duplicate name.
pub async fn create<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    ValidJson(request): ValidJson<ZoneRequest>,
) -> WebResult<(StatusCode, Json<ZoneResponse>)> {
    let zone = state.zones.create(request).await?;
    Ok((StatusCode::CREATED, Json(zone.into())))
}

/// `GET /api/zones` → 200 + zones ordered by name.
///
/// # Errors
///
/// 500 if storage fails.
pub async fn list<S: Storage + Clone>(
    State(state): State<AppState<S>>,
) -> WebResult<Json<Vec<ZoneResponse>>> {
    let zones = state.zones.list().await?;
    Ok(Json(zones.into_iter().map(ZoneResponse::from).collect()))
}

/// `GET /api/zones/{id}`.
///
/// # Errors
///
/// 404 if the zone does not exist.
pub async fn get<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
) -> WebResult<Json<ZoneResponse>> {
    let zone = state.zones.get(ZoneId::from_uuid(id)).await?;
    Ok(Json(zone.into()))
}

/// `PUT /api/zones/{id}`.
///
/// # Errors
///
/// 400, 404 or 409.
pub async fn update<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
    ValidJson(request): ValidJson<ZoneRequest>,
) -> WebResult<Json<ZoneResponse>> {
    let zone = state.zones.update(ZoneId::from_uuid(id), request).await?;
    Ok(Json(zone.into()))
}

/// `DELETE /api/zones/{id}` → 204.
///
/// # Errors
///
/// 404 if missing, 409 while spaces still reference the zone.
pub async fn delete<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
) -> WebResult<StatusCode> {
    state.zones.delete(ZoneId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/zones/{id}/spaces` → the zone's spaces ordered by code.
///
/// # Errors
///
/// 404 if the zone does not exist.
pub async fn spaces<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
) -> WebResult<Json<Vec<SpaceResponse>>> {
    let spaces = state.zones.spaces(ZoneId::from_uuid(id)).await?;
    Ok(Json(spaces.into_iter().map(SpaceResponse::from).collect()))
}

/// `GET /api/zones/{id}/occupancy`.
///
/// # Errors
///
/// 404 if the zone does not exist.
pub async fn occupancy<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
) -> WebResult<Json<ZoneOccupancy>> {
    Ok(Json(state.zones.occupancy(ZoneId::from_uuid(id)).await?))
}
