//! Ready-made domain values and requests.

use parkzone_core::capacity::normalize_reserved;
use parkzone_core::space::{Space, SpaceId, SpaceRequest, SpaceStatus};
use parkzone_core::zone::{Zone, ZoneId, ZoneRequest, ZoneType};

/// Active `VIP` zone with every unit available.
#[must_use]
pub fn zone(name: &str, capacity: u32) -> Zone {
    Zone {
        id: ZoneId::new(),
        name: name.to_string(),
        description: String::new(),
        capacity,
        available_capacity: Some(capacity),
        zone_type: ZoneType::Vip,
        is_active: true,
    }
}

/// Space in `zone_id` with the given state (normalized).
#[must_use]
pub fn space(code: &str, zone_id: ZoneId, status: SpaceStatus, reserved: bool) -> Space {
    Space {
        id: SpaceId::new(),
        code: code.to_string(),
        status,
        is_reserved: normalize_reserved(status, reserved),
        priority: None,
        zone_id,
    }
}

/// Free, unreserved space.
#[must_use]
pub fn available_space(code: &str, zone_id: ZoneId) -> Space {
    space(code, zone_id, SpaceStatus::Available, false)
}

/// Complete zone request.
#[must_use]
pub fn zone_request(name: &str, capacity: i64, zone_type: ZoneType) -> ZoneRequest {
    ZoneRequest {
        name: Some(name.to_string().into()),
        description: Some(format!("{name} zone").into()),
        capacity: Some(capacity.into()),
        zone_type: Some(zone_type.into()),
        is_active: Some(true.into()),
    }
}

/// Complete space request.
#[must_use]
pub fn space_request(code: &str, status: SpaceStatus, reserved: bool, zone_id: ZoneId) -> SpaceRequest {
    SpaceRequest {
        codigo: Some(code.to_string().into()),
        status: Some(status.into()),
        is_reserved: Some(reserved.into()),
        priority: None,
        id_zone: Some((*zone_id.as_uuid()).into()),
    }
}
