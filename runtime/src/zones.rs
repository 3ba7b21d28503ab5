//! Zone service.

use crate::context::ServiceContext;
use crate::metrics::{CapacityMetrics, ServiceMetrics};
use parkzone_core::capacity::{self, ZoneOccupancy};
use parkzone_core::events::{EventAction, NotificationEvent};
use parkzone_core::space::{Space, SpaceDetails};
use parkzone_core::storage::{Storage, StorageTx};
use parkzone_core::zone::{Zone, ZoneDraft, ZoneId, ZoneRequest};
use parkzone_core::ServiceError;
use std::time::Instant;

/// Create, read, update and delete zones.
///
/// Every operation runs in one transaction under the context deadline.
/// Mutations publish a notification after commit.
pub struct ZoneService<S: Storage> {
    storage: S,
    ctx: ServiceContext,
}

impl<S: Storage> ZoneService<S> {
    /// Create a service over `storage`.
    #[must_use]
    pub const fn new(storage: S, ctx: ServiceContext) -> Self {
        Self { storage, ctx }
    }

    /// Create a zone with all of its capacity available.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`] on validation failure,
    /// [`ServiceError::Conflict`] if the name is taken.
    #[tracing::instrument(skip(self, request), name = "zone_create")]
    pub async fn create(&self, request: ZoneRequest) -> Result<Zone, ServiceError> {
        let started = Instant::now();
        let draft = request.validate().map_err(ServiceError::InvalidInput)?;
        let zone = Zone::create(draft);

        self.ctx
            .within_deadline("zone_create", self.insert(&zone))
            .await?;

        tracing::info!(zone_id = %zone.id, name = %zone.name, capacity = zone.capacity, "Zone created");
        ServiceMetrics::record_zone_op("create", started.elapsed());
        self.publish(EventAction::Create, &zone).await;
        Ok(zone)
    }

    /// Fetch one zone.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no such zone exists.
    pub async fn get(&self, id: ZoneId) -> Result<Zone, ServiceError> {
        self.ctx.within_deadline("zone_get", self.fetch(id)).await
    }

    /// Every zone, ordered by name.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Internal`] on storage failure.
    pub async fn list(&self) -> Result<Vec<Zone>, ServiceError> {
        self.ctx.within_deadline("zone_list", self.fetch_all()).await
    }

    /// Replace a zone's fields.
    ///
    /// When the capacity changes, the available counter is recomputed from
    /// the zone's spaces instead of being adjusted, which also repairs any
    /// drift.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`], [`ServiceError::NotFound`] or
    /// [`ServiceError::Conflict`] if the new name is taken.
    #[tracing::instrument(skip(self, request), name = "zone_update", fields(zone_id = %id))]
    pub async fn update(&self, id: ZoneId, request: ZoneRequest) -> Result<Zone, ServiceError> {
        let started = Instant::now();
        let draft = request.validate().map_err(ServiceError::InvalidInput)?;

        let zone = self
            .ctx
            .within_deadline("zone_update", self.replace(id, draft))
            .await?;

        tracing::info!(available_capacity = zone.available(), "Zone updated");
        ServiceMetrics::record_zone_op("update", started.elapsed());
        self.publish(EventAction::Update, &zone).await;
        Ok(zone)
    }

    /// Delete a zone that no longer has spaces.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`], or [`ServiceError::Conflict`] while spaces
    /// still reference the zone.
    #[tracing::instrument(skip(self), name = "zone_delete", fields(zone_id = %id))]
    pub async fn delete(&self, id: ZoneId) -> Result<(), ServiceError> {
        let started = Instant::now();

        let zone = self.ctx.within_deadline("zone_delete", self.remove(id)).await?;

        tracing::info!(name = %zone.name, "Zone deleted");
        ServiceMetrics::record_zone_op("delete", started.elapsed());
        self.publish(EventAction::Delete, &zone).await;
        Ok(())
    }

    /// Spaces of one zone, ordered by code.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no such zone exists.
    pub async fn spaces(&self, id: ZoneId) -> Result<Vec<SpaceDetails>, ServiceError> {
        let (zone, spaces) = self
            .ctx
            .within_deadline("zone_spaces", self.fetch_with_spaces(id))
            .await?;
        Ok(spaces
            .into_iter()
            .map(|space| SpaceDetails {
                space,
                zone_name: zone.name.clone(),
            })
            .collect())
    }

    /// Breakdown of a zone's spaces by state, read in one transaction.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no such zone exists.
    pub async fn occupancy(&self, id: ZoneId) -> Result<ZoneOccupancy, ServiceError> {
        let (zone, spaces) = self
            .ctx
            .within_deadline("zone_occupancy", self.fetch_with_spaces(id))
            .await?;
        Ok(ZoneOccupancy::from_spaces(&zone, &spaces))
    }

    async fn insert(&self, zone: &Zone) -> Result<(S::Tx, ()), ServiceError> {
        let mut tx = self.storage.begin().await?;
        tx.save_zone(zone).await?;
        Ok((tx, ()))
    }

    async fn fetch(&self, id: ZoneId) -> Result<(S::Tx, Zone), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let zone = tx
            .find_zone(id)
            .await?
            .ok_or_else(|| ServiceError::zone_not_found(id))?;
        Ok((tx, zone))
    }

    async fn fetch_all(&self) -> Result<(S::Tx, Vec<Zone>), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let zones = tx.find_all_zones().await?;
        Ok((tx, zones))
    }

    async fn fetch_with_spaces(
        &self,
        id: ZoneId,
    ) -> Result<(S::Tx, (Zone, Vec<Space>)), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let zone = tx
            .find_zone(id)
            .await?
            .ok_or_else(|| ServiceError::zone_not_found(id))?;
        let spaces = tx.find_spaces_by_zone(id).await?;
        Ok((tx, (zone, spaces)))
    }

    async fn replace(&self, id: ZoneId, draft: ZoneDraft) -> Result<(S::Tx, Zone), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let mut zone = lock_one(&mut tx, id).await?;

        if zone.apply_draft(draft) {
            let spaces = tx.find_spaces_by_zone(id).await?;
            let blocking = capacity::count_blocking(&spaces);
            let available = capacity::recount(zone.capacity, blocking);
            CapacityMetrics::record_recount();
            tracing::debug!(
                capacity = zone.capacity,
                blocking,
                available_capacity = available,
                "Recounted available capacity"
            );
            zone.available_capacity = Some(available);
        }

        tx.save_zone(&zone).await?;
        Ok((tx, zone))
    }

    async fn remove(&self, id: ZoneId) -> Result<(S::Tx, Zone), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let zone = lock_one(&mut tx, id).await?;

        let remaining = tx.find_spaces_by_zone(id).await?.len();
        if remaining > 0 {
            return Err(ServiceError::Conflict(format!(
                "zone {} still has {remaining} space(s)",
                zone.name
            )));
        }

        if !tx.delete_zone(id).await? {
            return Err(ServiceError::zone_not_found(id));
        }
        Ok((tx, zone))
    }

    async fn publish(&self, action: EventAction, zone: &Zone) {
        let event = NotificationEvent::for_zone(self.ctx.source(), action, zone, self.ctx.now());
        self.ctx.notify(event).await;
    }
}

async fn lock_one<T: StorageTx>(tx: &mut T, id: ZoneId) -> Result<Zone, ServiceError> {
    tx.lock_zones(&[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::zone_not_found(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::context::ServiceSettings;
    use parkzone_core::environment::Clock;
    use parkzone_core::events::EntityKind;
    use parkzone_core::space::SpaceStatus;
    use parkzone_core::zone::ZoneType;
    use parkzone_testing::{InMemoryStorage, RecordingPublisher, fixtures, test_clock};
    use std::sync::Arc;

    fn service() -> (ZoneService<InMemoryStorage>, InMemoryStorage, RecordingPublisher) {
        let storage = InMemoryStorage::new();
        let publisher = RecordingPublisher::new();
        let ctx = ServiceContext::new(
            Arc::new(publisher.clone()),
            Arc::new(test_clock()),
            ServiceSettings::default(),
        );
        (ZoneService::new(storage.clone(), ctx), storage, publisher)
    }

    #[tokio::test]
    async fn create_sets_full_availability_and_publishes() {
        let (zones, _, publisher) = service();
        let zone = zones
            .create(fixtures::zone_request("VIP-1", 20, ZoneType::Vip))
            .await
            .unwrap();

        assert_eq!(zone.available_capacity, Some(20));
        assert_eq!(publisher.kinds(), vec![(EventAction::Create, EntityKind::Zone)]);
        assert_eq!(publisher.events()[0].timestamp, test_clock().now());
    }

    #[tokio::test]
    async fn invalid_requests_touch_nothing() {
        let (zones, storage, publisher) = service();
        let err = zones
            .create(fixtures::zone_request("Z", 3, ZoneType::Vip))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(storage.snapshot().await.zones.is_empty());
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let (zones, _, _) = service();
        zones.create(fixtures::zone_request("A", 10, ZoneType::Vip)).await.unwrap();
        let err = zones
            .create(fixtures::zone_request("A", 12, ZoneType::External))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Conflict("zone name already exists".to_string()));
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let (zones, _, _) = service();
        for name in ["C", "A", "B"] {
            zones.create(fixtures::zone_request(name, 10, ZoneType::Internal)).await.unwrap();
        }
        let names: Vec<_> = zones.list().await.unwrap().into_iter().map(|z| z.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn capacity_change_recounts_and_repairs_drift() {
        let (zones, storage, _) = service();
        let mut zone = fixtures::zone("Z2", 10);
        zone.available_capacity = Some(2);
        storage.seed_zone(zone.clone()).await;
        storage
            .seed_space(fixtures::space("S-1", zone.id, SpaceStatus::Occupied, false))
            .await;

        let updated = zones
            .update(zone.id, fixtures::zone_request("Z2", 5, ZoneType::Vip))
            .await
            .unwrap();
        assert_eq!(updated.available_capacity, Some(4));
    }

    #[tokio::test]
    async fn unchanged_capacity_keeps_counter() {
        let (zones, storage, _) = service();
        let mut zone = fixtures::zone("Z", 10);
        zone.available_capacity = Some(7);
        storage.seed_zone(zone.clone()).await;

        let updated = zones
            .update(zone.id, fixtures::zone_request("Renamed", 10, ZoneType::External))
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.available_capacity, Some(7));
    }

    #[tokio::test]
    async fn update_missing_zone_is_not_found() {
        let (zones, _, publisher) = service();
        let err = zones
            .update(ZoneId::new(), fixtures::zone_request("Z", 10, ZoneType::Vip))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Zone", .. }));
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn delete_rejects_zone_with_spaces() {
        let (zones, storage, _) = service();
        let zone = fixtures::zone("Z", 10);
        storage.seed_zone(zone.clone()).await;
        storage.seed_space(fixtures::available_space("S-1", zone.id)).await;

        let err = zones.delete(zone.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(storage.zone(zone.id).await.is_some());
    }

    #[tokio::test]
    async fn delete_empty_zone_publishes_error_severity() {
        let (zones, storage, publisher) = service();
        let zone = fixtures::zone("Z", 10);
        storage.seed_zone(zone.clone()).await;

        zones.delete(zone.id).await.unwrap();
        assert!(storage.zone(zone.id).await.is_none());
        let events = publisher.events();
        assert_eq!(events[0].action, EventAction::Delete);
        assert_eq!(events[0].severity, parkzone_core::events::Severity::Error);

        assert!(matches!(
            zones.delete(zone.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn occupancy_summarizes_spaces() {
        let (zones, storage, _) = service();
        let mut zone = fixtures::zone("Z", 10);
        zone.available_capacity = Some(8);
        storage.seed_zone(zone.clone()).await;
        storage
            .seed_space(fixtures::space("A", zone.id, SpaceStatus::Occupied, false))
            .await;
        storage
            .seed_space(fixtures::space("B", zone.id, SpaceStatus::Available, true))
            .await;
        storage
            .seed_space(fixtures::space("C", zone.id, SpaceStatus::Maintenance, false))
            .await;

        let summary = zones.occupancy(zone.id).await.unwrap();
        assert_eq!(summary.total_spaces, 3);
        assert_eq!(summary.blocking, 2);
        assert_eq!(summary.maintenance, 1);

        let spaces = zones.spaces(zone.id).await.unwrap();
        let codes: Vec<_> = spaces.iter().map(|d| d.space.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
        assert!(spaces.iter().all(|d| d.zone_name == "Z"));
    }

    #[tokio::test]
    async fn publish_failure_does_not_undo_commit() {
        let (zones, storage, publisher) = service();
        publisher.set_failing(true);
        let zone = zones
            .create(fixtures::zone_request("Z", 10, ZoneType::Vip))
            .await
            .unwrap();
        assert!(storage.zone(zone.id).await.is_some());
        assert!(publisher.is_empty());
    }
}
