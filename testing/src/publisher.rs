//! Publisher that records instead of sending.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use parkzone_core::events::{EventAction, EntityKind, EventPublisher, NotificationEvent, PublishError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Captures published events for assertions.
///
/// When [`set_failing`](Self::set_failing) is on, every publish fails and
/// nothing is recorded.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    events: Arc<RwLock<Vec<NotificationEvent>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingPublisher {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.read().unwrap().clone()
    }

    /// `(action, entity)` pairs, oldest first.
    #[must_use]
    pub fn kinds(&self) -> Vec<(EventAction, EntityKind)> {
        self.events
            .read()
            .unwrap()
            .iter()
            .map(|e| (e.action, e.entity_type))
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().unwrap().is_empty()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.write().unwrap().clear();
    }

    /// Make subsequent publishes fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PublishError::PublishFailed {
                    topic: "test".to_string(),
                    reason: "broker unavailable".to_string(),
                });
            }
            self.events.write().unwrap().push(event.clone());
            Ok(())
        })
    }
}
