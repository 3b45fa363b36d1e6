//! Gateway event types
//!
//! Event names sent in the `t` field of dispatch messages.

use folio_service::realtime::CHANGE_EVENT_TYPE;
use folio_service::services::NOTIFICATION_EVENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    /// Sent after Identify
    Ready,
    /// A project subscription is live
    Subscribed,
    /// A project subscription has ended
    Unsubscribed,
    /// A subscribe request was refused; the connection stays open
    SubscribeFailed,
    /// A committed change in a subscribed project
    Change,
    /// Outcome notice addressed to the identified user
    Notification,
}

impl GatewayEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Subscribed => "SUBSCRIBED",
            Self::Unsubscribed => "UNSUBSCRIBED",
            Self::SubscribeFailed => "SUBSCRIBE_FAILED",
            Self::Change => CHANGE_EVENT_TYPE,
            Self::Notification => NOTIFICATION_EVENT_TYPE,
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_serde() {
        for event in [
            GatewayEventType::Ready,
            GatewayEventType::Subscribed,
            GatewayEventType::Unsubscribed,
            GatewayEventType::SubscribeFailed,
            GatewayEventType::Change,
            GatewayEventType::Notification,
        ] {
            let json = serde_json::to_value(event).unwrap();
            assert_eq!(json, event.as_str());
        }
    }
}
