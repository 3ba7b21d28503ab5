//! # Parkzone Runtime
//!
//! Zone and space services: validation, one transaction per operation under a
//! deadline, capacity bookkeeping, and post-commit notifications.
//!
//! ## Example
//!
//! ```ignore
//! use parkzone_runtime::{ServiceContext, ServiceSettings, SpaceService, ZoneService};
//!
//! let ctx = ServiceContext::new(publisher, Arc::new(SystemClock), ServiceSettings::default());
//! let zones = ZoneService::new(storage.clone(), ctx.clone());
//! let spaces = SpaceService::new(storage, ctx);
//!
//! let zone = zones.create(request).await?;
//! ```

pub mod context;
pub mod metrics;
pub mod spaces;
pub mod zones;

pub use context::{DEFAULT_DEADLINE, ServiceContext, ServiceSettings};
pub use spaces::SpaceService;
pub use zones::ZoneService;
