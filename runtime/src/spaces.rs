//! Space service.
//!
//! Every write path follows the same shape inside one transaction:
//!
//! 1. resolve the target zone (`ZoneNotFound` otherwise)
//! 2. lock the existing space row, when there is one
//! 3. ask the capacity engine for a [`CapacityPlan`](parkzone_core::capacity::CapacityPlan)
//! 4. lock the affected zone rows in ascending id order
//! 5. persist the space, then the adjusted zones
//! 6. commit, then publish
//!
//! The deadline covers steps 1 to 5; a commit that has been sent is awaited.
//!
//! Locks are always taken space first, zones second, zones ascending, so two
//! writers can never wait on each other in a cycle.

use crate::context::{ServiceContext, apply_plan};
use crate::metrics::ServiceMetrics;
use parkzone_core::capacity;
use parkzone_core::events::{EventAction, NotificationEvent};
use parkzone_core::space::{Space, SpaceDetails, SpaceDraft, SpaceFilter, SpaceId, SpaceRequest};
use parkzone_core::storage::{Storage, StorageTx};
use parkzone_core::zone::{Zone, ZoneId};
use parkzone_core::ServiceError;
use std::collections::HashMap;
use std::time::Instant;

/// Create, read, update and delete spaces while keeping zone counters exact.
pub struct SpaceService<S: Storage> {
    storage: S,
    ctx: ServiceContext,
}

impl<S: Storage> SpaceService<S> {
    /// Create a service over `storage`.
    #[must_use]
    pub const fn new(storage: S, ctx: ServiceContext) -> Self {
        Self { storage, ctx }
    }

    /// Create a space and take a unit from its zone when it is blocking.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`], [`ServiceError::ZoneNotFound`] or
    /// [`ServiceError::Conflict`] if the code is taken.
    #[tracing::instrument(skip(self, request), name = "space_create")]
    pub async fn create(&self, request: SpaceRequest) -> Result<SpaceDetails, ServiceError> {
        let started = Instant::now();
        let draft = request.validate().map_err(ServiceError::InvalidInput)?;
        let space = Space::create(draft);

        let details = self
            .ctx
            .within_deadline("space_create", self.insert(space))
            .await?;

        tracing::info!(
            space_id = %details.space.id,
            zone_id = %details.space.zone_id,
            blocking = details.space.is_blocking(),
            "Space created"
        );
        ServiceMetrics::record_space_op("create", started.elapsed());
        self.publish(EventAction::Create, &details.space).await;
        Ok(details)
    }

    /// Fetch one space with its zone name.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no such space exists.
    pub async fn get(&self, id: SpaceId) -> Result<SpaceDetails, ServiceError> {
        self.ctx.within_deadline("space_get", self.fetch(id)).await
    }

    /// Spaces matching `filter`, ordered by code.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Internal`] on storage failure.
    pub async fn list(&self, filter: SpaceFilter) -> Result<Vec<SpaceDetails>, ServiceError> {
        self.ctx.within_deadline("space_list", self.fetch_all(filter)).await
    }

    /// Replace a space's fields, possibly moving it to another zone.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`], [`ServiceError::ZoneNotFound`],
    /// [`ServiceError::NotFound`] or [`ServiceError::Conflict`] if the new
    /// code is taken.
    #[tracing::instrument(skip(self, request), name = "space_update", fields(space_id = %id))]
    pub async fn update(
        &self,
        id: SpaceId,
        request: SpaceRequest,
    ) -> Result<SpaceDetails, ServiceError> {
        let started = Instant::now();
        let draft = request.validate().map_err(ServiceError::InvalidInput)?;

        let details = self
            .ctx
            .within_deadline("space_update", self.replace(id, draft))
            .await?;

        tracing::info!(zone_id = %details.space.zone_id, "Space updated");
        ServiceMetrics::record_space_op("update", started.elapsed());
        self.publish(EventAction::Update, &details.space).await;
        Ok(details)
    }

    /// Delete a space and give its unit back when it was blocking.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no such space exists.
    #[tracing::instrument(skip(self), name = "space_delete", fields(space_id = %id))]
    pub async fn delete(&self, id: SpaceId) -> Result<(), ServiceError> {
        let started = Instant::now();

        let space = self.ctx.within_deadline("space_delete", self.remove(id)).await?;

        tracing::info!(zone_id = %space.zone_id, "Space deleted");
        ServiceMetrics::record_space_op("delete", started.elapsed());
        self.publish(EventAction::Delete, &space).await;
        Ok(())
    }

    async fn insert(&self, space: Space) -> Result<(S::Tx, SpaceDetails), ServiceError> {
        let mut tx = self.storage.begin().await?;

        let mut zones = tx.lock_zones(&[space.zone_id]).await?;
        let zone_name = zone_name(&zones, space.zone_id)
            .ok_or_else(|| ServiceError::ZoneNotFound(space.zone_id.to_string()))?;

        let plan = capacity::on_space_create(&space);
        tx.save_space(&space).await?;
        apply_plan(&mut tx, &plan, &mut zones).await?;

        Ok((tx, SpaceDetails { space, zone_name }))
    }

    async fn fetch(&self, id: SpaceId) -> Result<(S::Tx, SpaceDetails), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let space = tx
            .find_space(id)
            .await?
            .ok_or_else(|| ServiceError::space_not_found(id))?;
        let zone = tx.find_zone(space.zone_id).await?.ok_or_else(|| {
            ServiceError::Internal(format!("space {id} references missing zone {}", space.zone_id))
        })?;

        let details = SpaceDetails {
            space,
            zone_name: zone.name,
        };
        Ok((tx, details))
    }

    async fn fetch_all(
        &self,
        filter: SpaceFilter,
    ) -> Result<(S::Tx, Vec<SpaceDetails>), ServiceError> {
        let mut tx = self.storage.begin().await?;
        let spaces = tx.find_spaces(filter).await?;
        let names: HashMap<ZoneId, String> = tx
            .find_all_zones()
            .await?
            .into_iter()
            .map(|z| (z.id, z.name))
            .collect();

        let details = spaces
            .into_iter()
            .map(|space| SpaceDetails {
                zone_name: names.get(&space.zone_id).cloned().unwrap_or_default(),
                space,
            })
            .collect();
        Ok((tx, details))
    }

    async fn replace(
        &self,
        id: SpaceId,
        draft: SpaceDraft,
    ) -> Result<(S::Tx, SpaceDetails), ServiceError> {
        let mut tx = self.storage.begin().await?;

        let target = draft.zone_id;
        if tx.find_zone(target).await?.is_none() {
            return Err(ServiceError::ZoneNotFound(target.to_string()));
        }

        let old = tx
            .lock_space(id)
            .await?
            .ok_or_else(|| ServiceError::space_not_found(id))?;
        let new = old.with_draft(draft);
        let plan = capacity::on_space_update(&old, &new);

        let mut zones = tx.lock_zones(&[old.zone_id, new.zone_id]).await?;
        let zone_name = zone_name(&zones, target)
            .ok_or_else(|| ServiceError::ZoneNotFound(target.to_string()))?;

        if old.zone_id != new.zone_id {
            tracing::debug!(from = %old.zone_id, to = %new.zone_id, "Reassigning space");
        }

        tx.save_space(&new).await?;
        apply_plan(&mut tx, &plan, &mut zones).await?;

        let details = SpaceDetails {
            space: new,
            zone_name,
        };
        Ok((tx, details))
    }

    async fn remove(&self, id: SpaceId) -> Result<(S::Tx, Space), ServiceError> {
        let mut tx = self.storage.begin().await?;

        let space = tx
            .lock_space(id)
            .await?
            .ok_or_else(|| ServiceError::space_not_found(id))?;
        let plan = capacity::on_space_delete(&space);
        let mut zones = tx.lock_zones(&plan.zones()).await?;

        if !tx.delete_space(id).await? {
            return Err(ServiceError::space_not_found(id));
        }
        apply_plan(&mut tx, &plan, &mut zones).await?;

        Ok((tx, space))
    }

    async fn publish(&self, action: EventAction, space: &Space) {
        let event = NotificationEvent::for_space(self.ctx.source(), action, space, self.ctx.now());
        self.ctx.notify(event).await;
    }
}

fn zone_name(zones: &[Zone], id: ZoneId) -> Option<String> {
    zones.iter().find(|z| z.id == id).map(|z| z.name.clone())
}
