//! Payload definitions for non-dispatch messages

use folio_core::Snowflake;
use serde::{Deserialize, Serialize};

/// Interval clients should heartbeat at, in milliseconds
pub const HEARTBEAT_INTERVAL_MS: u64 = 45_000;

/// Silence after which the server drops a connection, in milliseconds
pub const HEARTBEAT_TIMEOUT_MS: u64 = 90_000;

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
    pub heartbeat_timeout: u64,
}

impl HelloPayload {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_INTERVAL_MS,
            heartbeat_timeout: HEARTBEAT_TIMEOUT_MS,
        }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Identify)
///
/// Optional: unidentified connections may still watch projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Access token, with or without a `Bearer ` prefix
    pub token: String,
}

impl IdentifyPayload {
    /// The token without its scheme prefix
    #[must_use]
    pub fn bare_token(&self) -> &str {
        self.token.strip_prefix("Bearer ").unwrap_or(&self.token)
    }
}

/// Payload for op 3 (Subscribe) and op 4 (Unsubscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    pub project_id: Snowflake,
}
