//! Parking zone and space service: configuration and bootstrap.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;

pub use app::{BoxError, run};
pub use config::{Config, ConfigError};
