//! Redpanda notification publisher for parkzone.
//!
//! Implements [`EventPublisher`] from `parkzone-core` with rdkafka, so any
//! Kafka-compatible broker works (Redpanda, Apache Kafka, MSK, ...).
//!
//! Every zone and space mutation becomes one JSON message on a single topic.
//! The topic plays the role of the notifications exchange and the message key
//! the role of its routing key; consumers that bind by key keep working.
//!
//! # Delivery Semantics
//!
//! **Best effort.** Messages are sent after the database commit. A failed or
//! timed-out send is reported as [`PublishError`] and the caller logs it; the
//! mutation is never undone.
//!
//! # Example
//!
//! ```no_run
//! use parkzone_redpanda::RedpandaPublisher;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = RedpandaPublisher::builder()
//!     .brokers("localhost:9092")
//!     .topic("notifications.exchange")
//!     .routing_key("notifications.routingkey")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use parkzone_core::events::{EventPublisher, NotificationEvent, PublishError};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default topic name.
pub const DEFAULT_TOPIC: &str = "notifications.exchange";

/// Default message key.
pub const DEFAULT_ROUTING_KEY: &str = "notifications.routingkey";

/// Kafka-compatible [`EventPublisher`].
///
/// # Example
///
/// ```no_run
/// use parkzone_redpanda::RedpandaPublisher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Defaults: topic `notifications.exchange`, key `notifications.routingkey`
/// let publisher = RedpandaPublisher::new("localhost:9092")?;
///
/// // Custom configuration
/// let publisher = RedpandaPublisher::builder()
///     .brokers("localhost:9092,localhost:9093")
///     .producer_acks("all")
///     .compression("lz4")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaPublisher {
    producer: FutureProducer,
    brokers: String,
    topic: String,
    routing_key: String,
    timeout: Duration,
}

impl RedpandaPublisher {
    /// Create a publisher with default topic, key and producer settings.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConnectionFailed`] if the producer cannot be
    /// created from the broker list.
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder() -> RedpandaPublisherBuilder {
        RedpandaPublisherBuilder::default()
    }

    /// Broker list.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Message key used for every event.
    #[must_use]
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }
}

/// Builder for a [`RedpandaPublisher`].
#[derive(Default)]
pub struct RedpandaPublisherBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    routing_key: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaPublisherBuilder {
    /// Set the broker addresses.
    ///
    /// # Parameters
    ///
    /// - `brokers`: Comma-separated list of broker addresses (e.g., "localhost:9092")
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the destination topic.
    ///
    /// Default: [`DEFAULT_TOPIC`]
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the message key.
    ///
    /// Default: [`DEFAULT_ROUTING_KEY`]
    #[must_use]
    pub fn routing_key(mut self, key: impl Into<String>) -> Self {
        self.routing_key = Some(key.into());
        self
    }

    /// Set the producer acknowledgment mode.
    ///
    /// # Parameters
    ///
    /// - `acks`: "0" (no acks), "1" (leader ack), "all" (all replicas ack)
    ///
    /// Default: "1"
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec.
    ///
    /// # Parameters
    ///
    /// - `compression`: "none", "gzip", "snappy", "lz4", "zstd"
    ///
    /// Default: "none"
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the [`RedpandaPublisher`].
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConnectionFailed`] if brokers are not set or
    /// the producer configuration is rejected.
    pub fn build(self) -> Result<RedpandaPublisher, PublishError> {
        let brokers = self
            .brokers
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| PublishError::ConnectionFailed("Brokers not configured".to_string()))?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        let acks = self.producer_acks.as_deref().unwrap_or("1");
        let compression = self.compression.as_deref().unwrap_or("none");

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks)
            .set("compression.type", compression)
            .create()
            .map_err(|e| PublishError::ConnectionFailed(format!("Failed to create producer: {e}")))?;

        let topic = self.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        let routing_key = self
            .routing_key
            .unwrap_or_else(|| DEFAULT_ROUTING_KEY.to_string());

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            routing_key = %routing_key,
            acks,
            compression,
            "RedpandaPublisher created"
        );

        Ok(RedpandaPublisher {
            producer,
            brokers,
            topic,
            routing_key,
            timeout,
        })
    }
}

/// Encode an event as the JSON message body.
///
/// # Errors
///
/// Returns [`PublishError::Serialization`] if encoding fails.
pub fn encode(event: &NotificationEvent) -> Result<Vec<u8>, PublishError> {
    serde_json::to_vec(event).map_err(|e| PublishError::Serialization(e.to_string()))
}

impl EventPublisher for RedpandaPublisher {
    fn publish<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = encode(event)?;
            let record = FutureRecord::to(&self.topic)
                .payload(&payload)
                .key(self.routing_key.as_bytes());

            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %self.topic,
                        partition,
                        offset,
                        event_id = %event.id,
                        "Notification delivered"
                    );
                    Ok(())
                },
                Err((kafka_error, _)) => Err(PublishError::PublishFailed {
                    topic: self.topic.clone(),
                    reason: kafka_error.to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parkzone_core::events::{DEFAULT_SOURCE, EventAction};
    use parkzone_core::zone::{Zone, ZoneDraft, ZoneType};

    #[test]
    fn redpanda_publisher_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaPublisher>();
        assert_sync::<RedpandaPublisher>();
    }

    #[test]
    fn build_without_brokers_fails() {
        let result = RedpandaPublisher::builder().build();
        assert!(matches!(result, Err(PublishError::ConnectionFailed(_))));
    }

    #[test]
    fn build_applies_defaults() {
        // Producer creation does not contact the broker.
        let publisher = RedpandaPublisher::new("localhost:9092").unwrap();
        assert_eq!(publisher.topic(), DEFAULT_TOPIC);
        assert_eq!(publisher.routing_key(), DEFAULT_ROUTING_KEY);
        assert_eq!(publisher.brokers(), "localhost:9092");
    }

    #[test]
    fn encoded_payload_is_camel_case_json() {
        let zone = Zone::create(ZoneDraft {
            name: "VIP-1".to_string(),
            description: String::new(),
            capacity: 20,
            zone_type: ZoneType::Vip,
            is_active: true,
        });
        let at = chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let event = NotificationEvent::for_zone(DEFAULT_SOURCE, EventAction::Create, &zone, at);

        let json: serde_json::Value = serde_json::from_slice(&encode(&event).unwrap()).unwrap();
        assert_eq!(json["microservice"], DEFAULT_SOURCE);
        assert_eq!(json["entityType"], "ZONE");
        assert_eq!(json["data"]["availableCapacity"], 20);
    }
}
