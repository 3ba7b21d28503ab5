//! Zones: named containers of parking spaces.

use crate::error::FieldError;
use crate::input::{Lenient, optional, required};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Smallest capacity a zone may declare.
pub const MIN_CAPACITY: u32 = 5;

/// Largest capacity a zone may declare.
pub const MAX_CAPACITY: u32 = 25;

/// Maximum length of a zone name, in characters.
pub const MAX_NAME_LEN: usize = 25;

/// Unique identifier for a zone
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(Uuid);

impl ZoneId {
    /// Creates a new random `ZoneId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ZoneId` from a `Uuid`
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

impl Default for ZoneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of zone. Closed set, no behavioral variance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneType {
    /// Reserved for VIP vehicles
    Vip,
    /// Staff / internal use
    Internal,
    /// Visitors
    External,
}

impl ZoneType {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vip => "VIP",
            Self::Internal => "INTERNAL",
            Self::External => "EXTERNAL",
        }
    }
}

impl FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIP" => Ok(Self::Vip),
            "INTERNAL" => Ok(Self::Internal),
            "EXTERNAL" => Ok(Self::External),
            other => Err(format!("Invalid zone type: {other}")),
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parking zone.
///
/// `available_capacity` is `None` only for legacy rows written before the
/// counter existed; readers treat that as "fully available" via
/// [`Zone::available`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    /// Server-generated identifier
    pub id: ZoneId,
    /// Unique, non-blank, at most 25 characters
    pub name: String,
    /// Free text, may be empty
    pub description: String,
    /// Declared number of spaces, in `[5, 25]`
    pub capacity: u32,
    /// Materialized `capacity - blocking spaces`
    pub available_capacity: Option<u32>,
    /// Kind of zone
    pub zone_type: ZoneType,
    /// Whether the zone is in service
    pub is_active: bool,
}

impl Zone {
    /// Build a brand-new zone from a validated draft. All capacity is available.
    #[must_use]
    pub fn create(draft: ZoneDraft) -> Self {
        Self {
            id: ZoneId::new(),
            name: draft.name,
            description: draft.description,
            capacity: draft.capacity,
            available_capacity: Some(draft.capacity),
            zone_type: draft.zone_type,
            is_active: draft.is_active,
        }
    }

    /// Effective available capacity (legacy `None` reads as `capacity`).
    #[must_use]
    pub fn available(&self) -> u32 {
        self.available_capacity.unwrap_or(self.capacity)
    }

    /// Overwrite the descriptive fields from a draft.
    ///
    /// Capacity bookkeeping is left to the caller, which must recount when
    /// the returned flag is `true`.
    pub fn apply_draft(&mut self, draft: ZoneDraft) -> bool {
        let capacity_changed = self.capacity != draft.capacity;
        self.name = draft.name;
        self.description = draft.description;
        self.capacity = draft.capacity;
        self.zone_type = draft.zone_type;
        self.is_active = draft.is_active;
        capacity_changed
    }
}

/// Zone payload as received from clients.
///
/// Every field is optional and [`Lenient`] so that missing or mistyped values
/// surface as field-level validation errors rather than opaque
/// deserialization failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    /// Zone name
    pub name: Option<Lenient<String>>,
    /// Description
    pub description: Option<Lenient<String>>,
    /// Declared capacity
    pub capacity: Option<Lenient<i64>>,
    /// Zone type
    #[serde(rename = "type")]
    pub zone_type: Option<Lenient<ZoneType>>,
    /// Active flag (defaults to `true`)
    pub is_active: Option<Lenient<bool>>,
}

/// A validated [`ZoneRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneDraft {
    /// Trimmed name
    pub name: String,
    /// Description (empty when omitted)
    pub description: String,
    /// Capacity within bounds
    pub capacity: u32,
    /// Zone type
    pub zone_type: ZoneType,
    /// Active flag
    pub is_active: bool,
}

impl ZoneRequest {
    /// Validate the request, collecting every field error.
    ///
    /// # Errors
    ///
    /// Returns all field errors found: blank or over-long name, missing or
    /// out-of-range capacity, missing or unknown type, and any field of the
    /// wrong JSON type.
    pub fn validate(self) -> Result<ZoneDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = required(self.name, "name", "Name is required", "Name must be a string", &mut errors);
        let name = name.as_deref().map(str::trim);
        match name {
            Some("") => errors.push(FieldError::new("name", "Name is required")),
            Some(n) if n.chars().count() > MAX_NAME_LEN => errors.push(FieldError::new(
                "name",
                format!("Name must not exceed {MAX_NAME_LEN} characters"),
            )),
            _ => {},
        }

        let description = optional(
            self.description,
            "description",
            "Description must be a string",
            &mut errors,
        );

        let capacity = match required(
            self.capacity,
            "capacity",
            "Capacity is required",
            "Capacity must be a whole number",
            &mut errors,
        ) {
            None => None,
            Some(c) if c < i64::from(MIN_CAPACITY) => {
                errors.push(FieldError::new(
                    "capacity",
                    format!("Capacity must be at least {MIN_CAPACITY}"),
                ));
                None
            },
            Some(c) if c > i64::from(MAX_CAPACITY) => {
                errors.push(FieldError::new(
                    "capacity",
                    format!("Capacity must not exceed {MAX_CAPACITY}"),
                ));
                None
            },
            Some(c) => u32::try_from(c).ok(),
        };

        let zone_type = required(
            self.zone_type,
            "type",
            "Type is required",
            "Type must be one of VIP, INTERNAL, EXTERNAL",
            &mut errors,
        );

        let is_active = optional(self.is_active, "isActive", "isActive must be a boolean", &mut errors);

        match (name, capacity, zone_type) {
            (Some(name), Some(capacity), Some(zone_type)) if errors.is_empty() => Ok(ZoneDraft {
                name: name.to_string(),
                description: description.unwrap_or_default(),
                capacity,
                zone_type,
                is_active: is_active.unwrap_or(true),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn request(name: Option<&str>, capacity: Option<i64>) -> ZoneRequest {
        ZoneRequest {
            name: name.map(|n| n.to_string().into()),
            description: None,
            capacity: capacity.map(Lenient::from),
            zone_type: Some(ZoneType::Vip.into()),
            is_active: None,
        }
    }

    #[test]
    fn valid_request_applies_defaults() {
        let draft = request(Some("  VIP-1 "), Some(20)).validate().unwrap();
        assert_eq!(draft.name, "VIP-1");
        assert_eq!(draft.description, "");
        assert_eq!(draft.capacity, 20);
        assert!(draft.is_active);
    }

    #[test]
    fn capacity_bounds_are_inclusive() {
        assert!(request(Some("a"), Some(5)).validate().is_ok());
        assert!(request(Some("a"), Some(25)).validate().is_ok());

        let low = request(Some("a"), Some(3)).validate().unwrap_err();
        assert_eq!(low[0].field, "capacity");
        assert_eq!(low[0].message, "Capacity must be at least 5");

        let high = request(Some("a"), Some(26)).validate().unwrap_err();
        assert_eq!(high[0].message, "Capacity must not exceed 25");
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = ZoneRequest::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "capacity", "type"]);
    }

    #[test]
    fn blank_and_long_names_rejected() {
        assert!(request(Some("   "), Some(10)).validate().is_err());
        let long = "x".repeat(26);
        let errors = request(Some(&long), Some(10)).validate().unwrap_err();
        assert_eq!(errors[0].field, "name");
        assert!(request(Some(&"x".repeat(25)), Some(10)).validate().is_ok());
    }

    #[test]
    fn zone_type_wire_format() {
        let json = serde_json::to_string(&ZoneType::Internal).unwrap();
        assert_eq!(json, "\"INTERNAL\"");
        assert_eq!("EXTERNAL".parse::<ZoneType>().unwrap(), ZoneType::External);
        assert!("vip".parse::<ZoneType>().is_err());
    }

    #[test]
    fn request_reads_camel_case_and_type_keyword() {
        let req: ZoneRequest = serde_json::from_str(
            r#"{"name":"VIP-1","capacity":20,"type":"VIP","isActive":false}"#,
        )
        .unwrap();
        assert_eq!(req.zone_type, Some(ZoneType::Vip.into()));
        assert_eq!(req.is_active, Some(false.into()));
    }

    #[test]
    fn mistyped_fields_become_field_errors() {
        let req: ZoneRequest = serde_json::from_str(
            r#"{"name":"Z","capacity":"ten","type":"GOLD","isActive":"yes"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["capacity", "type", "isActive"]);
        assert_eq!(errors[0].message, "Capacity must be a whole number");
        assert_eq!(errors[1].message, "Type must be one of VIP, INTERNAL, EXTERNAL");
    }

    #[test]
    fn non_string_name_is_a_name_error() {
        let req: ZoneRequest =
            serde_json::from_str(r#"{"name":42,"capacity":10,"type":"VIP"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "Name must be a string")]);
    }

    #[test]
    fn legacy_null_counter_reads_as_capacity() {
        let mut zone = Zone::create(request(Some("Z"), Some(10)).validate().unwrap());
        zone.available_capacity = None;
        assert_eq!(zone.available(), 10);
    }

    #[test]
    fn apply_draft_reports_capacity_change() {
        let mut zone = Zone::create(request(Some("Z"), Some(10)).validate().unwrap());
        assert!(!zone.apply_draft(request(Some("Z2"), Some(10)).validate().unwrap()));
        assert_eq!(zone.name, "Z2");
        assert!(zone.apply_draft(request(Some("Z2"), Some(5)).validate().unwrap()));
    }
}
