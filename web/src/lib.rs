//! Axum HTTP surface for parkzone.
//!
//! Maps the `/api/zones` and `/api/spaces` resources onto the zone and space
//! services, and the service error taxonomy onto status codes:
//!
//! | Error | Status |
//! |---|---|
//! | invalid input | 400 with `details: [{field, message}]` |
//! | not found | 404 |
//! | conflict | 409 |
//! | timeout | 504 |
//! | internal | 500, generic message |
//!
//! # Example
//!
//! ```
//! use parkzone_core::environment::SystemClock;
//! use parkzone_core::events::TracingPublisher;
//! use parkzone_runtime::{ServiceContext, ServiceSettings};
//! use parkzone_testing::InMemoryStorage;
//! use parkzone_web::{AppState, router};
//! use std::sync::Arc;
//!
//! let ctx = ServiceContext::new(
//!     Arc::new(TracingPublisher),
//!     Arc::new(SystemClock),
//!     ServiceSettings::default(),
//! );
//! let app = router(AppState::new(InMemoryStorage::new(), &ctx));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{CorrelationId, IdPath, ValidJson, ValidQuery};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use router::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
