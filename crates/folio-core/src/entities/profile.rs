//! Display profile used to decorate reactions and comments

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

pub const UNKNOWN_USER_NAME: &str = "Unknown User";

/// Author display data, read-only from the engine's point of view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Snowflake,
    pub name: String,
    pub avatar: String,
}

impl Profile {
    pub fn new(user_id: Snowflake, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            avatar: avatar.into(),
        }
    }

    /// Stand-in used when a profile cannot be loaded
    pub fn placeholder(user_id: Snowflake) -> Self {
        Self::new(user_id, UNKNOWN_USER_NAME, "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == UNKNOWN_USER_NAME && self.avatar.is_empty()
    }
}
