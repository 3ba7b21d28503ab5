//! # Parkzone Core
//!
//! Domain model and the capacity-consistency rules for a parking-lot topology
//! service: a catalog of [`Zone`](zone::Zone)s and the [`Space`](space::Space)s
//! that belong to them.
//!
//! ## Core Concepts
//!
//! - **Zone**: named, capacity-bearing container of spaces
//! - **Space**: a single parking slot, owned by exactly one zone
//! - **Blocking space**: a space that is reserved or occupied and therefore
//!   consumes one unit of its zone's capacity
//! - **Available capacity**: `max(0, capacity - blocking spaces)`, materialized
//!   on every zone
//!
//! ## Architecture
//!
//! This crate is the functional core. It performs no I/O:
//!
//! - [`capacity`] decides, for every write, how `availableCapacity` moves
//! - [`storage`] describes the transactional storage gateway
//! - [`events`] describes the notification format and the publisher seam
//! - [`input`] carries request fields through to validation
//! - [`environment`] abstracts time
//!
//! The imperative shell (services, PostgreSQL, Redpanda, HTTP) lives in the
//! sibling crates and depends on these traits only.
//!
//! ## Example
//!
//! ```
//! use parkzone_core::capacity;
//! use parkzone_core::space::{Space, SpaceId, SpaceStatus};
//! use parkzone_core::zone::ZoneId;
//!
//! let zone_id = ZoneId::new();
//! let space = Space {
//!     id: SpaceId::new(),
//!     code: "A-001".to_string(),
//!     status: SpaceStatus::Occupied,
//!     is_reserved: false,
//!     priority: None,
//!     zone_id,
//! };
//!
//! let plan = capacity::on_space_create(&space);
//! assert_eq!(plan.delta_for(zone_id), -1);
//! ```

pub mod capacity;
pub mod environment;
pub mod error;
pub mod events;
pub mod input;
pub mod space;
pub mod storage;
pub mod zone;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{FieldError, ServiceError, StorageError};
pub use input::Lenient;
pub use space::{Space, SpaceDetails, SpaceId, SpaceRequest, SpaceStatus};
pub use zone::{Zone, ZoneId, ZoneRequest, ZoneType};
