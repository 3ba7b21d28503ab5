//! Spaces: individual parking slots owned by a zone.

use crate::capacity;
use crate::error::FieldError;
use crate::input::{Lenient, optional, required};
use crate::zone::ZoneId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a space code, in characters.
pub const MAX_CODE_LEN: usize = 20;

/// Unique identifier for a space
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(Uuid);

impl SpaceId {
    /// Creates a new random `SpaceId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `SpaceId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SpaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical state of a space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpaceStatus {
    /// Free
    Available,
    /// A vehicle is parked
    Occupied,
    /// Out of service; does not consume capacity
    Maintenance,
}

impl SpaceStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
            Self::Maintenance => "MAINTENANCE",
        }
    }
}

impl FromStr for SpaceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "OCCUPIED" => Ok(Self::Occupied),
            "MAINTENANCE" => Ok(Self::Maintenance),
            other => Err(format!("Invalid space status: {other}")),
        }
    }
}

impl fmt::Display for SpaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parking space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Space {
    /// Server-generated identifier
    pub id: SpaceId,
    /// Unique code, at most 20 characters
    pub code: String,
    /// Physical state
    pub status: SpaceStatus,
    /// Reservation flag, always `false` while occupied
    pub is_reserved: bool,
    /// Ordering hint, uninterpreted
    pub priority: Option<i32>,
    /// Owning zone
    pub zone_id: ZoneId,
}

impl Space {
    /// Build a new space from a validated draft.
    #[must_use]
    pub fn create(draft: SpaceDraft) -> Self {
        Self {
            id: SpaceId::new(),
            code: draft.code,
            status: draft.status,
            is_reserved: draft.is_reserved,
            priority: draft.priority,
            zone_id: draft.zone_id,
        }
    }

    /// The same space with its fields replaced by `draft`.
    #[must_use]
    pub fn with_draft(&self, draft: SpaceDraft) -> Self {
        Self {
            id: self.id,
            code: draft.code,
            status: draft.status,
            is_reserved: draft.is_reserved,
            priority: draft.priority,
            zone_id: draft.zone_id,
        }
    }

    /// Whether this space consumes a unit of its zone's capacity.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        capacity::is_blocking(self.status, self.is_reserved)
    }
}

/// A space together with the name of its zone, as returned by reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpaceDetails {
    /// The space
    pub space: Space,
    /// Name of the owning zone
    pub zone_name: String,
}

/// Optional filters for listing spaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpaceFilter {
    /// Only spaces in this zone
    pub zone_id: Option<ZoneId>,
    /// Only spaces with this status
    pub status: Option<SpaceStatus>,
}

impl SpaceFilter {
    /// Whether `space` passes the filter.
    #[must_use]
    pub fn matches(&self, space: &Space) -> bool {
        self.zone_id.is_none_or(|z| z == space.zone_id)
            && self.status.is_none_or(|s| s == space.status)
    }
}

/// Space payload as received from clients.
///
/// Fields are [`Lenient`] so that mistyped values and unknown statuses are
/// reported per field by [`SpaceRequest::validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceRequest {
    /// Space code
    pub codigo: Option<Lenient<String>>,
    /// Physical state
    pub status: Option<Lenient<SpaceStatus>>,
    /// Reservation flag (defaults to `false`)
    pub is_reserved: Option<Lenient<bool>>,
    /// Ordering hint
    pub priority: Option<Lenient<i32>>,
    /// Target zone
    pub id_zone: Option<Lenient<Uuid>>,
}

/// A validated and normalized [`SpaceRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpaceDraft {
    /// Trimmed code
    pub code: String,
    /// Physical state
    pub status: SpaceStatus,
    /// Reservation flag after normalization
    pub is_reserved: bool,
    /// Ordering hint
    pub priority: Option<i32>,
    /// Target zone
    pub zone_id: ZoneId,
}

impl SpaceRequest {
    /// Validate the request and normalize the reservation flag.
    ///
    /// An occupied space is never reserved: `isReserved` is forced to `false`
    /// when `status` is `OCCUPIED`.
    ///
    /// # Errors
    ///
    /// Returns all field errors found: blank or over-long code, missing or
    /// unknown status, missing zone reference, and any field of the wrong
    /// JSON type.
    pub fn validate(self) -> Result<SpaceDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let code = required(self.codigo, "codigo", "Code is required", "Code must be a string", &mut errors);
        let code = code.as_deref().map(str::trim);
        match code {
            Some("") => errors.push(FieldError::new("codigo", "Code is required")),
            Some(c) if c.chars().count() > MAX_CODE_LEN => errors.push(FieldError::new(
                "codigo",
                format!("Code must not exceed {MAX_CODE_LEN} characters"),
            )),
            _ => {},
        }

        let status = required(
            self.status,
            "status",
            "Status is required",
            "Status must be one of AVAILABLE, OCCUPIED, MAINTENANCE",
            &mut errors,
        );
        let is_reserved = optional(
            self.is_reserved,
            "isReserved",
            "isReserved must be a boolean",
            &mut errors,
        );
        let priority = optional(self.priority, "priority", "Priority must be a whole number", &mut errors);
        let zone = required(
            self.id_zone,
            "idZone",
            "Zone is required",
            "idZone must be a UUID",
            &mut errors,
        );

        match (code, status, zone) {
            (Some(code), Some(status), Some(zone)) if errors.is_empty() => Ok(SpaceDraft {
                code: code.to_string(),
                status,
                is_reserved: capacity::normalize_reserved(status, is_reserved.unwrap_or(false)),
                priority,
                zone_id: ZoneId::from_uuid(zone),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn request(status: SpaceStatus, reserved: bool) -> SpaceRequest {
        SpaceRequest {
            codigo: Some("A-001".to_string().into()),
            status: Some(status.into()),
            is_reserved: Some(reserved.into()),
            priority: None,
            id_zone: Some(Uuid::new_v4().into()),
        }
    }

    #[test]
    fn occupied_clears_reserved_flag() {
        let draft = request(SpaceStatus::Occupied, true).validate().unwrap();
        assert!(!draft.is_reserved);
    }

    #[test]
    fn reserved_flag_kept_for_other_statuses() {
        assert!(request(SpaceStatus::Available, true).validate().unwrap().is_reserved);
        assert!(request(SpaceStatus::Maintenance, true).validate().unwrap().is_reserved);
    }

    #[test]
    fn missing_reserved_defaults_to_false() {
        let mut req = request(SpaceStatus::Available, true);
        req.is_reserved = None;
        assert!(!req.validate().unwrap().is_reserved);
    }

    #[test]
    fn code_rules() {
        let mut req = request(SpaceStatus::Available, false);
        req.codigo = Some(" ".to_string().into());
        assert_eq!(req.validate().unwrap_err()[0].field, "codigo");

        let mut req = request(SpaceStatus::Available, false);
        req.codigo = Some("C".repeat(21).into());
        assert!(req.validate().is_err());

        let mut req = request(SpaceStatus::Available, false);
        req.codigo = Some(" B-7 ".to_string().into());
        assert_eq!(req.validate().unwrap().code, "B-7");
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = SpaceRequest::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["codigo", "status", "idZone"]);
    }

    #[test]
    fn request_reads_wire_names() {
        let zone = Uuid::new_v4();
        let json = format!(
            r#"{{"codigo":"A-1","status":"OCCUPIED","isReserved":true,"priority":null,"idZone":"{zone}"}}"#
        );
        let req: SpaceRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.id_zone, Some(zone.into()));
        assert_eq!(req.status, Some(SpaceStatus::Occupied.into()));
    }

    #[test]
    fn unknown_status_and_bad_zone_are_field_errors() {
        let req: SpaceRequest = serde_json::from_str(
            r#"{"codigo":"A-1","status":"PARKED","priority":"high","idZone":"nope"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "priority", "idZone"]);
        assert_eq!(
            errors[0].message,
            "Status must be one of AVAILABLE, OCCUPIED, MAINTENANCE"
        );
    }

    #[test]
    fn filter_matches_on_both_axes() {
        let zone = ZoneId::new();
        let space = Space::create(SpaceDraft {
            code: "X".to_string(),
            status: SpaceStatus::Maintenance,
            is_reserved: false,
            priority: Some(1),
            zone_id: zone,
        });
        assert!(SpaceFilter::default().matches(&space));
        assert!(SpaceFilter { zone_id: Some(zone), status: None }.matches(&space));
        assert!(!SpaceFilter { zone_id: Some(ZoneId::new()), status: None }.matches(&space));
        assert!(!SpaceFilter { zone_id: None, status: Some(SpaceStatus::Occupied) }.matches(&space));
    }
}
