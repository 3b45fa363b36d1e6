//! Redis Pub/Sub publisher.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;
use folio_core::Snowflake;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Envelope for every Pub/Sub message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Event type name (e.g., `CHANGE`, `NOTIFICATION`)
    pub event_type: String,
    pub data: serde_json::Value,
}

impl PubSubEvent {
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// Wrap any serializable payload
    pub fn from_payload<T: Serialize>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone, Debug)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel, returning the number of receivers
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    pub async fn publish_to_project(
        &self,
        project_id: Snowflake,
        event: &PubSubEvent,
    ) -> RedisResult<u32> {
        self.publish(&PubSubChannel::project(project_id), event).await
    }

    pub async fn publish_to_user(&self, user_id: Snowflake, event: &PubSubEvent) -> RedisResult<u32> {
        self.publish(&PubSubChannel::user(user_id), event).await
    }
}
