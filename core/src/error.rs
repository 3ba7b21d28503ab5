//! Error taxonomy shared by every layer.
//!
//! - [`StorageError`] is what a storage gateway reports.
//! - [`ServiceError`] is what the services report to the outer surface.
//!
//! Services translate the former into the latter; only the HTTP layer turns a
//! [`ServiceError`] into a status code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field, as it appears on the wire
    pub field: String,
    /// Human-readable explanation
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a storage gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Row addressed by id does not exist
    #[error("Row not found")]
    NotFound,

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint
        constraint: String,
    },

    /// A foreign key rejected the write or delete
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Connection, driver, or query failure
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be decoded into the domain model
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Unique constraint guarding zone names.
pub const ZONE_NAME_CONSTRAINT: &str = "zones_name_key";

/// Unique constraint guarding space codes.
pub const SPACE_CODE_CONSTRAINT: &str = "spaces_code_key";

/// Errors surfaced by the zone and space services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Request failed validation
    #[error("Invalid input: {}", summarize(.0))]
    InvalidInput(Vec<FieldError>),

    /// Addressed entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// "Zone" or "Space"
        entity: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Zone referenced by a space payload does not exist
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// Uniqueness or dependency violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Per-request deadline exceeded; the transaction was rolled back
    #[error("Operation timed out")]
    Timeout,

    /// Unexpected storage or serialization failure
    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ServiceError {
    /// Shorthand for a missing zone addressed by id.
    #[must_use]
    pub fn zone_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Zone",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing space addressed by id.
    #[must_use]
    pub fn space_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Space",
            id: id.to_string(),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::UniqueViolation { constraint } if constraint == ZONE_NAME_CONSTRAINT => {
                Self::Conflict("zone name already exists".to_string())
            },
            StorageError::UniqueViolation { constraint } if constraint == SPACE_CODE_CONSTRAINT => {
                Self::Conflict("space code already exists".to_string())
            },
            StorageError::UniqueViolation { constraint } => {
                Self::Conflict(format!("unique constraint violated: {constraint}"))
            },
            StorageError::ForeignKeyViolation(constraint) => {
                tracing::debug!(%constraint, "Foreign key rejected write");
                Self::Conflict("zone still has spaces".to_string())
            },
            StorageError::NotFound => Self::Internal("row vanished during operation".to_string()),
            StorageError::Database(msg) | StorageError::Corrupt(msg) => Self::Internal(msg),
        }
    }
}
