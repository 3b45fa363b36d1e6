//! Dispatch payloads sent by the gateway

use folio_core::Snowflake;
use serde::{Deserialize, Serialize};

/// READY: the session is identified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    pub session_id: String,
    pub user_id: Snowflake,
    /// Projects this connection already watches
    pub subscriptions: Vec<Snowflake>,
}

/// SUBSCRIBED / UNSUBSCRIBED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub project_id: Snowflake,
}

/// SUBSCRIBE_FAILED
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeFailedEvent {
    pub project_id: Snowflake,
    pub code: String,
    pub message: String,
}
