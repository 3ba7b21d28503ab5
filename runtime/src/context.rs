//! Plumbing shared by the zone and space services.

use crate::metrics::{CapacityMetrics, PublishMetrics, ServiceMetrics};
use chrono::{DateTime, Utc};
use parkzone_core::capacity::{self, CapacityPlan};
use parkzone_core::environment::Clock;
use parkzone_core::events::{DEFAULT_SOURCE, EventPublisher, NotificationEvent};
use parkzone_core::storage::StorageTx;
use parkzone_core::zone::Zone;
use parkzone_core::ServiceError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default per-operation deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Tunables common to both services.
#[derive(Clone, Debug)]
pub struct ServiceSettings {
    /// Budget for one operation, from `begin` up to `commit`
    pub deadline: Duration,
    /// Value of the `microservice` field on notifications
    pub source: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

/// Injected collaborators other than storage.
#[derive(Clone)]
pub struct ServiceContext {
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
}

impl ServiceContext {
    /// Bundle a publisher, a clock and settings.
    #[must_use]
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            publisher,
            clock,
            settings,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn source(&self) -> &str {
        &self.settings.source
    }

    /// Run `work` under the deadline, then commit the transaction it hands
    /// back.
    ///
    /// On expiry `work` is dropped, which drops its open transaction and
    /// rolls it back. The commit itself is not raced against the deadline: once
    /// it is sent the outcome belongs to the database, and the caller sees it.
    pub(crate) async fn within_deadline<Tx, T, F>(
        &self,
        op: &'static str,
        work: F,
    ) -> Result<T, ServiceError>
    where
        Tx: StorageTx,
        F: Future<Output = Result<(Tx, T), ServiceError>> + Send,
    {
        let Ok(result) = tokio::time::timeout(self.settings.deadline, work).await else {
            tracing::warn!(
                op,
                deadline_ms = u64::try_from(self.settings.deadline.as_millis()).unwrap_or(u64::MAX),
                "Operation exceeded deadline, transaction rolled back"
            );
            ServiceMetrics::record_timeout();
            return Err(ServiceError::Timeout);
        };

        let (tx, value) = result?;
        tx.commit().await?;
        Ok(value)
    }

    /// Publish after commit. Failures are logged and swallowed.
    pub(crate) async fn notify(&self, event: NotificationEvent) {
        match self.publisher.publish(&event).await {
            Ok(()) => {
                PublishMetrics::record_published();
                tracing::debug!(event_id = %event.id, entity_id = %event.entity_id, "Notification published");
            },
            Err(e) => {
                PublishMetrics::record_failed();
                tracing::error!(
                    event_id = %event.id,
                    entity_id = %event.entity_id,
                    action = ?event.action,
                    error = %e,
                    "Failed to publish notification"
                );
            },
        }
    }
}

/// Apply `plan` to `locked` zones and persist every zone that moved.
///
/// `locked` must contain every zone in [`CapacityPlan::zones`], already held
/// `FOR UPDATE` by `tx`, and the space write must already be applied. The
/// zones in `locked` are updated in place.
///
/// A delta that saturates, or a release into a counter sitting at zero, can
/// only happen when a zone holds at least as many blocking spaces as its
/// capacity. The ±1 arithmetic is ambiguous there, so the counter is
/// recounted from the zone's spaces instead.
pub(crate) async fn apply_plan<T: StorageTx>(
    tx: &mut T,
    plan: &CapacityPlan,
    locked: &mut [Zone],
) -> Result<(), ServiceError> {
    for adjustment in plan.adjustments() {
        let zone = locked
            .iter_mut()
            .find(|z| z.id == adjustment.zone_id)
            .ok_or_else(|| {
                ServiceError::Internal(format!("zone {} was not locked", adjustment.zone_id))
            })?;

        let adjusted = capacity::apply_delta(zone.available_capacity, zone.capacity, adjustment.delta);
        let at_floor = zone.available() == 0 && adjustment.delta > 0;

        let value = if adjusted.clamped || at_floor {
            let spaces = tx.find_spaces_by_zone(zone.id).await?;
            let exact = capacity::recount(zone.capacity, capacity::count_blocking(&spaces));
            if adjusted.clamped {
                CapacityMetrics::record_clamp();
                tracing::warn!(
                    zone_id = %zone.id,
                    delta = adjustment.delta,
                    available_capacity = ?zone.available_capacity,
                    capacity = zone.capacity,
                    recounted = exact,
                    "Capacity delta saturated, recounted instead"
                );
            }
            CapacityMetrics::record_recount();
            exact
        } else {
            adjusted.value
        };

        tracing::debug!(
            zone_id = %zone.id,
            delta = adjustment.delta,
            available_capacity = value,
            "Applied capacity delta"
        );

        zone.available_capacity = Some(value);
        tx.save_zone(zone).await?;
    }
    Ok(())
}
