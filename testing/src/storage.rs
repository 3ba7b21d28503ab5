//! In-memory storage gateway.
//!
//! Transactions are fully serialized: [`InMemoryStorage::begin`] takes an
//! owned lock on the tables and works on a private copy, which
//! [`StorageTx::commit`] writes back. Dropping a transaction discards the
//! copy, so an abandoned or timed-out operation leaves no trace.
//!
//! Constraints mirror the relational schema: unique zone names, unique space
//! codes, and a restricting foreign key from spaces to zones.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use parkzone_core::error::{SPACE_CODE_CONSTRAINT, StorageError, ZONE_NAME_CONSTRAINT};
use parkzone_core::space::{Space, SpaceFilter, SpaceId};
use parkzone_core::storage::{Storage, StorageTx};
use parkzone_core::zone::{Zone, ZoneId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Foreign key from spaces to zones.
const SPACE_ZONE_FK: &str = "spaces_zone_id_fkey";

/// Committed rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tables {
    /// Zones by id
    pub zones: BTreeMap<ZoneId, Zone>,
    /// Spaces by id
    pub spaces: BTreeMap<SpaceId, Space>,
}

impl Tables {
    /// Spaces belonging to `zone_id`.
    pub fn spaces_in(&self, zone_id: ZoneId) -> impl Iterator<Item = &Space> {
        self.spaces.values().filter(move |s| s.zone_id == zone_id)
    }
}

/// In-memory [`Storage`] with transactional semantics.
///
/// # Example
///
/// ```
/// use parkzone_testing::InMemoryStorage;
///
/// # tokio_test::block_on(async {
/// let storage = InMemoryStorage::new();
/// assert!(storage.snapshot().await.zones.is_empty());
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    tables: Arc<Mutex<Tables>>,
    write_delay: Arc<RwLock<Option<Duration>>>,
    commit_delay: Arc<RwLock<Option<Duration>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed rows.
    ///
    /// Waits for any in-flight transaction to finish.
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    /// Committed zone by id.
    pub async fn zone(&self, id: ZoneId) -> Option<Zone> {
        self.tables.lock().await.zones.get(&id).cloned()
    }

    /// Committed space by id.
    pub async fn space(&self, id: SpaceId) -> Option<Space> {
        self.tables.lock().await.spaces.get(&id).cloned()
    }

    /// Insert a zone directly, bypassing services and constraints.
    ///
    /// Useful for legacy rows (`available_capacity = None`) and drift.
    pub async fn seed_zone(&self, zone: Zone) {
        self.tables.lock().await.zones.insert(zone.id, zone);
    }

    /// Insert a space directly, bypassing services and constraints.
    pub async fn seed_space(&self, space: Space) {
        self.tables.lock().await.spaces.insert(space.id, space);
    }

    /// Delay every row write by `delay`, so deadlines expire mid-transaction.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.write().unwrap() = delay;
    }

    /// Delay every commit by `delay`.
    pub fn set_commit_delay(&self, delay: Option<Duration>) {
        *self.commit_delay.write().unwrap() = delay;
    }

    /// Make `begin` and `ping` fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Database("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Storage for InMemoryStorage {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StorageError> {
        self.check_available()?;
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx {
            guard,
            working,
            write_delay: *self.write_delay.read().unwrap(),
            commit_delay: *self.commit_delay.read().unwrap(),
        })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check_available()
    }
}

/// Transaction over [`InMemoryStorage`].
#[derive(Debug)]
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    write_delay: Option<Duration>,
    commit_delay: Option<Duration>,
}

impl InMemoryTx {
    async fn before_write(&self) {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl StorageTx for InMemoryTx {
    async fn find_zone(&mut self, id: ZoneId) -> Result<Option<Zone>, StorageError> {
        Ok(self.working.zones.get(&id).cloned())
    }

    async fn lock_zones(&mut self, ids: &[ZoneId]) -> Result<Vec<Zone>, StorageError> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();
        Ok(ids
            .iter()
            .filter_map(|id| self.working.zones.get(id).cloned())
            .collect())
    }

    async fn find_all_zones(&mut self) -> Result<Vec<Zone>, StorageError> {
        let mut zones: Vec<Zone> = self.working.zones.values().cloned().collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(zones)
    }

    async fn save_zone(&mut self, zone: &Zone) -> Result<(), StorageError> {
        self.before_write().await;
        let taken = self
            .working
            .zones
            .values()
            .any(|z| z.id != zone.id && z.name == zone.name);
        if taken {
            return Err(StorageError::UniqueViolation {
                constraint: ZONE_NAME_CONSTRAINT.to_string(),
            });
        }
        self.working.zones.insert(zone.id, zone.clone());
        Ok(())
    }

    async fn delete_zone(&mut self, id: ZoneId) -> Result<bool, StorageError> {
        self.before_write().await;
        if self.working.spaces_in(id).next().is_some() {
            return Err(StorageError::ForeignKeyViolation(SPACE_ZONE_FK.to_string()));
        }
        Ok(self.working.zones.remove(&id).is_some())
    }

    async fn find_space(&mut self, id: SpaceId) -> Result<Option<Space>, StorageError> {
        Ok(self.working.spaces.get(&id).cloned())
    }

    async fn lock_space(&mut self, id: SpaceId) -> Result<Option<Space>, StorageError> {
        Ok(self.working.spaces.get(&id).cloned())
    }

    async fn find_spaces(&mut self, filter: SpaceFilter) -> Result<Vec<Space>, StorageError> {
        let mut spaces: Vec<Space> = self
            .working
            .spaces
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        spaces.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(spaces)
    }

    async fn save_space(&mut self, space: &Space) -> Result<(), StorageError> {
        self.before_write().await;
        if !self.working.zones.contains_key(&space.zone_id) {
            return Err(StorageError::ForeignKeyViolation(SPACE_ZONE_FK.to_string()));
        }
        let taken = self
            .working
            .spaces
            .values()
            .any(|s| s.id != space.id && s.code == space.code);
        if taken {
            return Err(StorageError::UniqueViolation {
                constraint: SPACE_CODE_CONSTRAINT.to_string(),
            });
        }
        self.working.spaces.insert(space.id, space.clone());
        Ok(())
    }

    async fn delete_space(&mut self, id: SpaceId) -> Result<bool, StorageError> {
        self.before_write().await;
        Ok(self.working.spaces.remove(&id).is_some())
    }

    async fn commit(mut self) -> Result<(), StorageError> {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        Ok(())
    }
}
