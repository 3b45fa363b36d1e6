//! Forwarding change events to other processes

use async_trait::async_trait;
use folio_cache::{PubSubEvent, Publisher};
use tracing::debug;

use super::events::{ChangeEvent, CHANGE_EVENT_TYPE};
use crate::services::{ServiceError, ServiceResult};

/// Forwards each delivered [`ChangeEvent`] beyond this process
#[async_trait]
pub trait EventRelay: Send + Sync {
    async fn relay(&self, event: &ChangeEvent) -> ServiceResult<()>;
}

/// Publishes change events on the project's Redis channel (`project:{id}`),
/// where gateway processes pick them up
#[derive(Debug, Clone)]
pub struct RedisEventRelay {
    publisher: Publisher,
}

impl RedisEventRelay {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl EventRelay for RedisEventRelay {
    async fn relay(&self, event: &ChangeEvent) -> ServiceResult<()> {
        let envelope = PubSubEvent::from_payload(CHANGE_EVENT_TYPE, event)
            .map_err(|e| ServiceError::internal(format!("encode change event: {e}")))?;

        let receivers = self
            .publisher
            .publish_to_project(event.project_id, &envelope)
            .await
            .map_err(|e| ServiceError::internal(format!("relay change event: {e}")))?;

        debug!(
            project_id = %event.project_id,
            seq = event.seq,
            receivers,
            "Change event relayed"
        );
        Ok(())
    }
}
