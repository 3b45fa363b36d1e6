//! External collaborators the engine talks to but does not own

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Verdict of a [`ContentValidator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Checks and cleans comment bodies before they are stored
///
/// Applies to every body, including AI-drafted ones.
pub trait ContentValidator: Send + Sync {
    fn validate(&self, text: &str) -> ValidationOutcome;

    fn sanitize(&self, text: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Failure,
}

/// A user-visible acknowledgement or failure message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient; `None` when the caller was anonymous
    pub user_id: Option<Snowflake>,
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(user_id: Option<Snowflake>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn failure(user_id: Option<Snowflake>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            level: NotificationLevel::Failure,
            message: message.into(),
        }
    }
}

/// Receives the outcome of every mutating call
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification);
}
