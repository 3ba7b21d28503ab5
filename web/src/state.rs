//! Application state shared by every handler.

use parkzone_core::storage::Storage;
use parkzone_runtime::{ServiceContext, SpaceService, ZoneService};
use std::sync::Arc;

/// Services plus the storage handle used by readiness checks.
///
/// Generic over the storage backend so the same router serves `PostgreSQL`
/// in production and the in-memory store in tests.
#[derive(Clone)]
pub struct AppState<S: Storage> {
    /// Zone operations
    pub zones: Arc<ZoneService<S>>,
    /// Space operations
    pub spaces: Arc<SpaceService<S>>,
    /// Backend, for `/ready`
    pub storage: S,
}

impl<S: Storage + Clone> AppState<S> {
    /// Build both services over clones of `storage`.
    #[must_use]
    pub fn new(storage: S, ctx: &ServiceContext) -> Self {
        Self {
            zones: Arc::new(ZoneService::new(storage.clone(), ctx.clone())),
            spaces: Arc::new(SpaceService::new(storage.clone(), ctx.clone())),
            storage,
        }
    }
}
