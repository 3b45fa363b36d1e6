//! Pub/Sub channel definitions.
//!
//! `project:{id}` carries realtime change events for one project,
//! `user:{id}` carries notifications addressed to one user.

use folio_core::Snowflake;

/// Channel prefix for project change events
pub const PROJECT_CHANNEL_PREFIX: &str = "project:";
/// Channel prefix for user notifications
pub const USER_CHANNEL_PREFIX: &str = "user:";
/// Pattern matching every project channel
pub const ALL_PROJECTS_PATTERN: &str = "project:*";

/// Pub/Sub channel types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    Project(Snowflake),
    User(Snowflake),
}

impl PubSubChannel {
    #[must_use]
    pub fn project(project_id: Snowflake) -> Self {
        Self::Project(project_id)
    }

    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Project(id) => format!("{PROJECT_CHANNEL_PREFIX}{id}"),
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
        }
    }

    /// Parse a Redis channel name; unknown names yield `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(id) = name.strip_prefix(PROJECT_CHANNEL_PREFIX) {
            return id.parse::<Snowflake>().ok().map(Self::Project);
        }
        if let Some(id) = name.strip_prefix(USER_CHANNEL_PREFIX) {
            return id.parse::<Snowflake>().ok().map(Self::User);
        }
        None
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}
