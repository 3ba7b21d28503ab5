//! # Parkzone Testing
//!
//! Test doubles and helpers for the parkzone crates.
//!
//! This crate provides:
//! - [`InMemoryStorage`]: transactional in-memory storage gateway
//! - [`RecordingPublisher`]: captures published notifications
//! - [`FixedClock`]: deterministic time
//! - [`fixtures`]: ready-made zones, spaces and requests
//! - [`properties`]: proptest strategies and invariant checks
//!
//! ## Example
//!
//! ```ignore
//! use parkzone_testing::{InMemoryStorage, RecordingPublisher, test_clock};
//!
//! #[tokio::test]
//! async fn creates_zone() {
//!     let storage = InMemoryStorage::new();
//!     let publisher = RecordingPublisher::new();
//!     let ctx = ServiceContext::new(
//!         Arc::new(publisher.clone()),
//!         Arc::new(test_clock()),
//!         ServiceSettings::default(),
//!     );
//!     let zones = ZoneService::new(storage.clone(), ctx);
//!
//!     zones.create(fixtures::zone_request("VIP-1", 20, ZoneType::Vip)).await?;
//!     assert_eq!(publisher.len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use parkzone_core::environment::Clock;

pub mod fixtures;
pub mod properties;
pub mod publisher;
pub mod storage;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use parkzone_testing::mocks::FixedClock;
    /// use parkzone_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use publisher::RecordingPublisher;
pub use storage::{InMemoryStorage, InMemoryTx, Tables};
