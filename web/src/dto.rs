//! Response bodies and query parameters.
//!
//! Request bodies are the core's [`parkzone_core::ZoneRequest`] and
//! [`parkzone_core::SpaceRequest`], deserialized as-is.

#![allow(missing_docs)]

use parkzone_core::space::{SpaceDetails, SpaceFilter, SpaceStatus};
use parkzone_core::zone::{Zone, ZoneId, ZoneType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A zone as returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub capacity: u32,
    pub available_capacity: u32,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub is_active: bool,
}

impl From<Zone> for ZoneResponse {
    fn from(zone: Zone) -> Self {
        Self {
            id: *zone.id.as_uuid(),
            available_capacity: zone.available(),
            name: zone.name,
            description: zone.description,
            capacity: zone.capacity,
            zone_type: zone.zone_type,
            is_active: zone.is_active,
        }
    }
}

/// A space as returned by the API, with its zone's id and name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceResponse {
    pub id: Uuid,
    pub codigo: String,
    pub status: SpaceStatus,
    pub is_reserved: bool,
    pub priority: Option<i32>,
    pub id_zone: Uuid,
    pub zone_name: String,
}

impl From<SpaceDetails> for SpaceResponse {
    fn from(details: SpaceDetails) -> Self {
        let space = details.space;
        Self {
            id: *space.id.as_uuid(),
            codigo: space.code,
            status: space.status,
            is_reserved: space.is_reserved,
            priority: space.priority,
            id_zone: *space.zone_id.as_uuid(),
            zone_name: details.zone_name,
        }
    }
}

/// Body of a successful space deletion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /api/spaces/?zoneId=..&status=..`
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceQuery {
    pub zone_id: Option<Uuid>,
    pub status: Option<SpaceStatus>,
}

impl From<SpaceQuery> for SpaceFilter {
    fn from(query: SpaceQuery) -> Self {
        Self {
            zone_id: query.zone_id.map(ZoneId::from_uuid),
            status: query.status,
        }
    }
}
