//! Routing of relayed Pub/Sub messages
//!
//! `project:{id}` CHANGE events go to the local realtime bridge, which fans
//! them out to subscribed connections. `user:{id}` NOTIFICATION events go to
//! every connection identified as that user.

use crate::connection::ConnectionManager;
use crate::events::GatewayEventType;
use folio_cache::{PubSubChannel, ReceivedMessage};
use folio_core::Snowflake;
use folio_service::realtime::CHANGE_EVENT_TYPE;
use folio_service::services::NOTIFICATION_EVENT_TYPE;
use folio_service::{ChangeEvent, RealtimeBridge};
use std::sync::Arc;

/// Where a relayed message ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Change { project_id: Snowflake, delivered: usize },
    Notification { user_id: Snowflake, sent: usize },
    Ignored,
}

#[derive(Clone)]
pub struct EventRouter {
    bridge: RealtimeBridge,
    connections: Arc<ConnectionManager>,
}

impl EventRouter {
    pub fn new(bridge: RealtimeBridge, connections: Arc<ConnectionManager>) -> Self {
        Self {
            bridge,
            connections,
        }
    }

    pub async fn route(&self, msg: &ReceivedMessage) -> Routed {
        let Some(event) = &msg.event else {
            tracing::debug!(channel = ?msg.channel, "Received non-event message, ignoring");
            return Routed::Ignored;
        };

        match (msg.channel, event.event_type.as_str()) {
            (Some(PubSubChannel::Project(project_id)), CHANGE_EVENT_TYPE) => {
                let change: ChangeEvent = match serde_json::from_value(event.data.clone()) {
                    Ok(change) => change,
                    Err(e) => {
                        tracing::warn!(project_id = %project_id, error = %e, "Malformed change event");
                        return Routed::Ignored;
                    }
                };
                if change.project_id != project_id {
                    tracing::warn!(
                        channel = %project_id,
                        event_project = %change.project_id,
                        "Change event published on another project's channel"
                    );
                    return Routed::Ignored;
                }

                let seq = change.seq;
                let delivered = self.bridge.deliver(change);
                tracing::trace!(project_id = %project_id, seq, delivered, "Change event routed");
                Routed::Change {
                    project_id,
                    delivered,
                }
            }
            (Some(PubSubChannel::User(user_id)), NOTIFICATION_EVENT_TYPE) => {
                let sent = self
                    .connections
                    .send_to_user(user_id, GatewayEventType::Notification, event.data.clone())
                    .await;
                Routed::Notification { user_id, sent }
            }
            (channel, event_type) => {
                tracing::debug!(channel = ?channel, event_type, "Unroutable event, ignoring");
                Routed::Ignored
            }
        }
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("bridge", &self.bridge)
            .field("connections", &self.connections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_cache::PubSubEvent;
    use folio_common::JwtService;
    use folio_core::events::CountersReconciledEvent;
    use folio_core::{Actor, DomainEvent};
    use folio_db::MemoryStore;
    use folio_service::ServiceContextBuilder;
    use tokio::sync::mpsc;

    const PROJECT: Snowflake = Snowflake::new(77);

    fn router() -> (EventRouter, RealtimeBridge, Arc<ConnectionManager>) {
        let ctx = ServiceContextBuilder::new()
            .memory_store(MemoryStore::with_open_projects())
            .jwt_service(Arc::new(JwtService::new("router-secret", 60)))
            .build()
            .unwrap();
        let bridge = ctx.bridge().clone();
        let connections = ConnectionManager::new_shared();
        (
            EventRouter::new(bridge.clone(), connections.clone()),
            bridge,
            connections,
        )
    }

    fn message(channel: PubSubChannel, event: PubSubEvent) -> ReceivedMessage {
        ReceivedMessage {
            channel: Some(channel),
            payload: event.to_json().unwrap(),
            event: Some(event),
        }
    }

    fn change(project_id: Snowflake, seq: u64) -> ChangeEvent {
        let event = DomainEvent::CountersReconciled(CountersReconciledEvent::new(project_id));
        ChangeEvent::new(seq, &event, None)
    }

    #[tokio::test]
    async fn test_change_is_delivered_to_bridge_subscribers() {
        let (router, bridge, _) = router();
        let mut receiver = bridge.receiver(PROJECT);

        let event = PubSubEvent::from_payload(CHANGE_EVENT_TYPE, &change(PROJECT, 12)).unwrap();
        let routed = router
            .route(&message(PubSubChannel::project(PROJECT), event))
            .await;

        assert_eq!(
            routed,
            Routed::Change {
                project_id: PROJECT,
                delivered: 1
            }
        );
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.seq, 12);
    }

    #[tokio::test]
    async fn test_change_on_wrong_channel_is_ignored() {
        let (router, bridge, _) = router();
        let _receiver = bridge.receiver(PROJECT);

        let event =
            PubSubEvent::from_payload(CHANGE_EVENT_TYPE, &change(Snowflake::new(5), 1)).unwrap();
        let routed = router
            .route(&message(PubSubChannel::project(PROJECT), event))
            .await;
        assert_eq!(routed, Routed::Ignored);
    }

    #[tokio::test]
    async fn test_malformed_change_is_ignored() {
        let (router, _, _) = router();
        let event = PubSubEvent::new(CHANGE_EVENT_TYPE, serde_json::json!({"seq": "nope"}));
        let routed = router
            .route(&message(PubSubChannel::project(PROJECT), event))
            .await;
        assert_eq!(routed, Routed::Ignored);
    }

    #[tokio::test]
    async fn test_notification_goes_to_user_connections() {
        let (router, _, connections) = router();
        let (tx, mut rx) = mpsc::channel(4);
        connections.add_connection("s1".to_string(), tx);
        connections
            .identify_connection("s1", Actor::member(Snowflake::new(3)))
            .await;

        let event = PubSubEvent::new(
            NOTIFICATION_EVENT_TYPE,
            serde_json::json!({"level": "success", "message": "Reaction saved"}),
        );
        let routed = router
            .route(&message(PubSubChannel::user(Snowflake::new(3)), event))
            .await;

        assert_eq!(
            routed,
            Routed::Notification {
                user_id: Snowflake::new(3),
                sent: 1
            }
        );
        let dispatched = rx.recv().await.unwrap();
        assert_eq!(dispatched.t.as_deref(), Some("NOTIFICATION"));
        assert_eq!(dispatched.d.unwrap()["message"], "Reaction saved");
    }

    #[tokio::test]
    async fn test_unknown_messages_are_ignored() {
        let (router, _, _) = router();
        let raw = ReceivedMessage {
            channel: None,
            event: None,
            payload: "garbage".to_string(),
        };
        assert_eq!(router.route(&raw).await, Routed::Ignored);

        let other = PubSubEvent::new("SOMETHING_ELSE", serde_json::Value::Null);
        let routed = router
            .route(&message(PubSubChannel::project(PROJECT), other))
            .await;
        assert_eq!(routed, Routed::Ignored);
    }
}
