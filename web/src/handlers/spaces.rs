//! `/api/spaces` handlers.

use crate::dto::{MessageResponse, SpaceQuery, SpaceResponse};
use crate::WebResult;
use crate::extractors::{IdPath, ValidJson, ValidQuery};
use crate::state::AppState;
use axum::{Json, extract::State};
use parkzone_core::SpaceRequest;
use parkzone_core::space::SpaceId;
use parkzone_core::storage::Storage;

/// `POST /api/spaces/` → 200 + space.
///
/// # Errors
///
/// 400 on validation failure, 404 if `idZone` does not exist, 409 on a
/// duplicate code.
pub async fn create<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    ValidJson(request): ValidJson<SpaceRequest>,
) -> WebResult<Json<SpaceResponse>> {
    let space = state.spaces.create(request).await?;
    Ok(Json(space.into()))
}

/// `GET /api/spaces/` with optional `zoneId` and `status` filters.
///
/// # Errors
///
/// 400 on an unparseable filter.
pub async fn list<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    ValidQuery(query): ValidQuery<SpaceQuery>,
) -> WebResult<Json<Vec<SpaceResponse>>> {
    let spaces = state.spaces.list(query.into()).await?;
    Ok(Json(spaces.into_iter().map(SpaceResponse::from).collect()))
}

/// `GET /api/spaces/{id}`.
///
/// # Errors
///
/// 404 if the space does not exist.
pub async fn get<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
) -> WebResult<Json<SpaceResponse>> {
    let space = state.spaces.get(SpaceId::from_uuid(id)).await?;
    Ok(Json(space.into()))
}

/// `PUT /api/spaces/{id}`, including zone reassignment.
///
/// # Errors
///
/// 400, 404 (space or target zone) or 409.
pub async fn update<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
    ValidJson(request): ValidJson<SpaceRequest>,
) -> WebResult<Json<SpaceResponse>> {
    let space = state.spaces.update(SpaceId::from_uuid(id), request).await?;
    Ok(Json(space.into()))
}

/// `DELETE /api/spaces/{id}` → 200 + confirmation message.
///
/// # Errors
///
/// 404 if the space does not exist.
pub async fn delete<S: Storage + Clone>(
    State(state): State<AppState<S>>,
    IdPath(id): IdPath,
) -> WebResult<Json<MessageResponse>> {
    state.spaces.delete(SpaceId::from_uuid(id)).await?;
    Ok(Json(MessageResponse {
        message: "Space deleted successfully".to_string(),
    }))
}
