//! Notification sinks

use async_trait::async_trait;
use folio_cache::{PubSubEvent, Publisher};
use folio_core::{Notification, NotificationLevel, NotificationSink};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Pub/Sub event type for user notifications
pub const NOTIFICATION_EVENT_TYPE: &str = "NOTIFICATION";

/// Writes every notification to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: Notification) {
        let user_id = notification.user_id.map(|id| id.to_string());
        match notification.level {
            NotificationLevel::Success => {
                info!(user_id = ?user_id, message = %notification.message, "Notify success");
            }
            NotificationLevel::Failure => {
                warn!(user_id = ?user_id, message = %notification.message, "Notify failure");
            }
        }
    }
}

/// Publishes notifications to the recipient's Redis channel (`user:{id}`)
///
/// Notifications for anonymous callers have no channel and are only logged.
#[derive(Debug, Clone)]
pub struct PubSubNotificationSink {
    publisher: Publisher,
}

impl PubSubNotificationSink {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl NotificationSink for PubSubNotificationSink {
    async fn notify(&self, notification: Notification) {
        let Some(user_id) = notification.user_id else {
            TracingNotificationSink.notify(notification).await;
            return;
        };

        let event = match PubSubEvent::from_payload(NOTIFICATION_EVENT_TYPE, &notification) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Failed to encode notification");
                return;
            }
        };

        if let Err(e) = self.publisher.publish_to_user(user_id, &event).await {
            warn!(user_id = %user_id, error = %e, "Failed to publish notification");
        }
    }
}

/// Keeps notifications in memory; handy for tests and local tooling
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationSink {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.received.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Snowflake;

    #[tokio::test]
    async fn test_memory_sink_records_in_order() {
        let sink = MemoryNotificationSink::new();
        sink.notify(Notification::success(Some(Snowflake::new(1)), "saved"))
            .await;
        sink.notify(Notification::failure(None, "Sign in to continue"))
            .await;

        let received = sink.received();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].level, NotificationLevel::Failure);
        assert_eq!(sink.last().unwrap().message, "Sign in to continue");
    }
}
