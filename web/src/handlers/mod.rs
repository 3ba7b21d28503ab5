//! HTTP request handlers, organized by resource.

pub mod health;
pub mod spaces;
pub mod zones;

pub use health::{health_check, readiness_check};
