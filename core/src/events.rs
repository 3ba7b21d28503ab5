//! Lifecycle notifications.
//!
//! After a mutation commits, the services build a [`NotificationEvent`] and
//! hand it to an [`EventPublisher`]. Delivery is best-effort: a failed
//! publish is logged by the caller and never undoes the committed write.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "id": "7b0e…",
//!   "microservice": "microservice - zonas",
//!   "action": "CREATE",
//!   "entityType": "ZONE",
//!   "entityId": "3f1c…",
//!   "message": "Zone created: VIP-1",
//!   "timestamp": "2025-01-01T12:00:00Z",
//!   "data": { "name": "VIP-1", "capacity": 20, "availableCapacity": 20, "type": "VIP" },
//!   "severity": "INFO"
//! }
//! ```

use crate::space::Space;
use crate::zone::Zone;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Default value of the `microservice` field.
pub const DEFAULT_SOURCE: &str = "microservice - zonas";

/// Kind of mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventAction {
    /// Entity created
    Create,
    /// Entity updated
    Update,
    /// Entity deleted
    Delete,
}

impl EventAction {
    /// Severity attached to events of this action.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Create => Severity::Info,
            Self::Update => Severity::Warn,
            Self::Delete => Severity::Error,
        }
    }

    /// Label used in metrics and human-readable messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

/// Kind of entity an event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    /// A zone
    Zone,
    /// A space
    Space,
}

/// Event severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// A lifecycle notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Fresh identifier per event
    pub id: Uuid,
    /// Name of the emitting service
    pub microservice: String,
    /// What happened
    pub action: EventAction,
    /// To what
    pub entity_type: EntityKind,
    /// Identifier of the affected entity
    pub entity_id: Uuid,
    /// Human-readable summary
    pub message: String,
    /// When the mutation committed
    pub timestamp: DateTime<Utc>,
    /// Entity snapshot
    pub data: BTreeMap<String, Value>,
    /// Derived from `action`
    pub severity: Severity,
}

impl NotificationEvent {
    /// Event describing a zone mutation.
    #[must_use]
    pub fn for_zone(source: &str, action: EventAction, zone: &Zone, at: DateTime<Utc>) -> Self {
        let data = BTreeMap::from([
            ("name".to_string(), json!(zone.name)),
            ("capacity".to_string(), json!(zone.capacity)),
            ("availableCapacity".to_string(), json!(zone.available())),
            ("type".to_string(), json!(zone.zone_type)),
            ("isActive".to_string(), json!(zone.is_active)),
        ]);
        Self {
            id: Uuid::new_v4(),
            microservice: source.to_string(),
            action,
            entity_type: EntityKind::Zone,
            entity_id: *zone.id.as_uuid(),
            message: format!("Zone {}: {}", action.past_tense(), zone.name),
            timestamp: at,
            data,
            severity: action.severity(),
        }
    }

    /// Event describing a space mutation.
    #[must_use]
    pub fn for_space(source: &str, action: EventAction, space: &Space, at: DateTime<Utc>) -> Self {
        let data = BTreeMap::from([
            ("code".to_string(), json!(space.code)),
            ("status".to_string(), json!(space.status)),
            ("isReserved".to_string(), json!(space.is_reserved)),
            ("priority".to_string(), json!(space.priority)),
            ("zoneId".to_string(), json!(space.zone_id)),
        ]);
        Self {
            id: Uuid::new_v4(),
            microservice: source.to_string(),
            action,
            entity_type: EntityKind::Space,
            entity_id: *space.id.as_uuid(),
            message: format!("Space {}: {}", action.past_tense(), space.code),
            timestamp: at,
            data,
            severity: action.severity(),
        }
    }
}

/// Errors that can occur while publishing.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// Event could not be encoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Broker rejected or timed out the message
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// Destination topic
        topic: String,
        /// Broker-reported reason
        reason: String,
    },

    /// Could not reach the broker
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Best-effort sink for [`NotificationEvent`]s.
///
/// Uses an explicit `Pin<Box<dyn Future>>` return so that services can hold an
/// `Arc<dyn EventPublisher>`.
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`] if the event could not be delivered.
    fn publish<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>>;
}

/// Publisher that only logs, used when the broker is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                event_id = %event.id,
                action = ?event.action,
                entity_type = ?event.entity_type,
                entity_id = %event.entity_id,
                message = %event.message,
                "Notification (broker disabled)"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::space::{SpaceId, SpaceStatus};
    use crate::zone::{ZoneId, ZoneType};

    fn zone() -> Zone {
        Zone {
            id: ZoneId::new(),
            name: "VIP-1".to_string(),
            description: String::new(),
            capacity: 20,
            available_capacity: Some(19),
            zone_type: ZoneType::Vip,
            is_active: true,
        }
    }

    #[test]
    fn severity_follows_action() {
        assert_eq!(EventAction::Create.severity(), Severity::Info);
        assert_eq!(EventAction::Update.severity(), Severity::Warn);
        assert_eq!(EventAction::Delete.severity(), Severity::Error);
    }

    #[test]
    fn zone_event_wire_shape() {
        let zone = zone();
        let event = NotificationEvent::for_zone(DEFAULT_SOURCE, EventAction::Create, &zone, Utc::now());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["microservice"], "microservice - zonas");
        assert_eq!(json["action"], "CREATE");
        assert_eq!(json["entityType"], "ZONE");
        assert_eq!(json["entityId"], zone.id.to_string());
        assert_eq!(json["severity"], "INFO");
        assert_eq!(json["message"], "Zone created: VIP-1");
        assert_eq!(json["data"]["availableCapacity"], 19);
        assert_eq!(json["data"]["type"], "VIP");
    }

    #[test]
    fn space_event_carries_zone_reference() {
        let space = Space {
            id: SpaceId::new(),
            code: "A-001".to_string(),
            status: SpaceStatus::Occupied,
            is_reserved: false,
            priority: Some(2),
            zone_id: ZoneId::new(),
        };
        let event = NotificationEvent::for_space("svc", EventAction::Delete, &space, Utc::now());
        assert_eq!(event.severity, Severity::Error);
        assert_eq!(event.entity_type, EntityKind::Space);
        assert_eq!(event.data["zoneId"], json!(space.zone_id.to_string()));
        assert_eq!(event.data["status"], json!("OCCUPIED"));
    }

    #[test]
    fn every_event_gets_a_fresh_id() {
        let zone = zone();
        let a = NotificationEvent::for_zone("svc", EventAction::Update, &zone, Utc::now());
        let b = NotificationEvent::for_zone("svc", EventAction::Update, &zone, Utc::now());
        assert_ne!(a.id, b.id);
    }
}
