//! Prometheus metrics for the zone and space services.
//!
//! # Example
//!
//! ```rust,no_run
//! use parkzone_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! let body = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address it should be scraped on.
///
/// [`start`](Self::start) installs the global recorder; serving
/// [`render`](Self::render) over HTTP is left to the binary.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Scrape address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. A recorder
    /// that is already installed (tests) is tolerated with a warning.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "parkzone_zone_operations_total",
        "Zone operations completed, by op"
    );
    describe_counter!(
        "parkzone_space_operations_total",
        "Space operations completed, by op"
    );
    describe_counter!(
        "parkzone_capacity_recounts_total",
        "Exact available-capacity recounts"
    );
    describe_counter!(
        "parkzone_capacity_clamped_total",
        "Capacity deltas that saturated at 0 or capacity"
    );
    describe_histogram!(
        "parkzone_operation_duration_seconds",
        "Time taken by a service operation, including commit"
    );
    describe_counter!(
        "parkzone_events_published_total",
        "Notifications delivered to the publisher"
    );
    describe_counter!(
        "parkzone_events_publish_failed_total",
        "Notifications the publisher failed to deliver"
    );
    describe_counter!(
        "parkzone_operation_timeouts_total",
        "Operations aborted by the request deadline"
    );
    describe_counter!(
        "parkzone_storage_errors_total",
        "Unexpected storage failures"
    );
    describe_counter!(
        "parkzone_http_requests_total",
        "HTTP requests served, by method and status"
    );
    describe_histogram!(
        "parkzone_http_request_duration_seconds",
        "HTTP request latency, by method"
    );
}

/// Service metrics recorder.
pub struct ServiceMetrics;

impl ServiceMetrics {
    /// Record a completed zone operation.
    pub fn record_zone_op(op: &'static str, duration: Duration) {
        counter!("parkzone_zone_operations_total", "op" => op).increment(1);
        histogram!("parkzone_operation_duration_seconds", "entity" => "zone", "op" => op)
            .record(duration.as_secs_f64());
    }

    /// Record a completed space operation.
    pub fn record_space_op(op: &'static str, duration: Duration) {
        counter!("parkzone_space_operations_total", "op" => op).increment(1);
        histogram!("parkzone_operation_duration_seconds", "entity" => "space", "op" => op)
            .record(duration.as_secs_f64());
    }

    /// Record an operation aborted by its deadline.
    pub fn record_timeout() {
        counter!("parkzone_operation_timeouts_total").increment(1);
    }
}

/// Capacity engine metrics recorder.
pub struct CapacityMetrics;

impl CapacityMetrics {
    /// Record an exact recount.
    pub fn record_recount() {
        counter!("parkzone_capacity_recounts_total").increment(1);
    }

    /// Record a saturated delta.
    pub fn record_clamp() {
        counter!("parkzone_capacity_clamped_total").increment(1);
    }
}

/// Publisher metrics recorder.
pub struct PublishMetrics;

impl PublishMetrics {
    /// Record a delivered notification.
    pub fn record_published() {
        counter!("parkzone_events_published_total").increment(1);
    }

    /// Record a failed notification.
    pub fn record_failed() {
        counter!("parkzone_events_publish_failed_total").increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn recorders_are_noops_without_exporter() {
        ServiceMetrics::record_zone_op("create", Duration::from_millis(3));
        CapacityMetrics::record_clamp();
        PublishMetrics::record_failed();
    }

    #[test]
    fn server_keeps_address() {
        let server = MetricsServer::new("127.0.0.1:9090".parse().unwrap());
        assert_eq!(server.addr().port(), 9090);
        assert!(server.render().is_none());
    }
}
