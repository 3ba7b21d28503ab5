//! Storage gateway.
//!
//! Every service operation runs inside exactly one [`StorageTx`]:
//!
//! ```text
//! begin ─► reads / lock_zones / writes ─► commit
//!                                     └─► drop or rollback (nothing persisted)
//! ```
//!
//! Implementations must roll back a transaction that is dropped without
//! [`StorageTx::commit`], which is how an expired request deadline discards
//! partial work.
//!
//! # Locking
//!
//! [`StorageTx::lock_space`] and [`StorageTx::lock_zones`] take exclusive row
//! locks held until the transaction ends. Callers lock the space row first and
//! then the zone rows in ascending id order; `lock_zones` sorts its input so
//! that every writer acquires zone locks in the same order.

use crate::error::StorageError;
use crate::space::{Space, SpaceFilter, SpaceId};
use crate::zone::{Zone, ZoneId};
use std::future::Future;

/// Factory for storage transactions.
pub trait Storage: Send + Sync + 'static {
    /// Transaction type produced by [`begin`](Self::begin).
    type Tx: StorageTx;

    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if no connection is available.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StorageError>> + Send;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the backend is unreachable.
    fn ping(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Reads and writes scoped to one transaction.
pub trait StorageTx: Send {
    /// Read a zone without locking it.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn find_zone(
        &mut self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<Zone>, StorageError>> + Send;

    /// Lock the given zone rows `FOR UPDATE`, in ascending id order, and
    /// return those that exist (ascending). Duplicates are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn lock_zones(
        &mut self,
        ids: &[ZoneId],
    ) -> impl Future<Output = Result<Vec<Zone>, StorageError>> + Send;

    /// All zones, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn find_all_zones(&mut self) -> impl Future<Output = Result<Vec<Zone>, StorageError>> + Send;

    /// Insert or replace a zone.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UniqueViolation`] when the name is taken.
    fn save_zone(&mut self, zone: &Zone) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a zone, returning whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ForeignKeyViolation`] when spaces still
    /// reference the zone.
    fn delete_zone(&mut self, id: ZoneId) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Read a space without locking it.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn find_space(
        &mut self,
        id: SpaceId,
    ) -> impl Future<Output = Result<Option<Space>, StorageError>> + Send;

    /// Read a space and lock its row `FOR UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn lock_space(
        &mut self,
        id: SpaceId,
    ) -> impl Future<Output = Result<Option<Space>, StorageError>> + Send;

    /// Spaces matching `filter`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn find_spaces(
        &mut self,
        filter: SpaceFilter,
    ) -> impl Future<Output = Result<Vec<Space>, StorageError>> + Send;

    /// Spaces belonging to `zone_id`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn find_spaces_by_zone(
        &mut self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<Vec<Space>, StorageError>> + Send {
        self.find_spaces(SpaceFilter {
            zone_id: Some(zone_id),
            status: None,
        })
    }

    /// Insert or replace a space.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UniqueViolation`] when the code is taken and
    /// [`StorageError::ForeignKeyViolation`] when the zone does not exist.
    fn save_space(&mut self, space: &Space)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a space, returning whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn delete_space(
        &mut self,
        id: SpaceId,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Make every write in this transaction durable.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the commit fails; nothing is persisted.
    fn commit(self) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Discard every write in this transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    fn rollback(self) -> impl Future<Output = Result<(), StorageError>> + Send;
}
