//! Comment entity - top-level comments and nested replies on a project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Body shown in place of a comment that was deleted while it still had replies
pub const TOMBSTONE_CONTENT: &str = "[deleted]";

/// Comment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Snowflake,
    pub project_id: Snowflake,
    pub user_id: Snowflake,
    pub content: String,
    pub parent_comment_id: Option<Snowflake>,
    /// 0 for top-level comments, parent depth + 1 for replies
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Direct children still present in the thread, tombstones included
    pub replies_count: i32,
    pub deleted: bool,
}

impl Comment {
    pub fn new_top_level(
        id: Snowflake,
        project_id: Snowflake,
        user_id: Snowflake,
        content: String,
    ) -> Self {
        Self {
            id,
            project_id,
            user_id,
            content,
            parent_comment_id: None,
            depth: 0,
            created_at: Utc::now(),
            updated_at: None,
            replies_count: 0,
            deleted: false,
        }
    }

    /// A reply inherits the parent's project and sits one level deeper.
    pub fn new_reply(id: Snowflake, parent: &Comment, user_id: Snowflake, content: String) -> Self {
        Self {
            id,
            project_id: parent.project_id,
            user_id,
            content,
            parent_comment_id: Some(parent.id),
            depth: parent.depth + 1,
            created_at: Utc::now(),
            updated_at: None,
            replies_count: 0,
            deleted: false,
        }
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    #[inline]
    pub fn is_edited(&self) -> bool {
        self.updated_at.is_some()
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.deleted
    }

    #[inline]
    pub fn has_replies(&self) -> bool {
        self.replies_count > 0
    }

    pub fn edit(&mut self, content: String) {
        self.content = content;
        self.updated_at = Some(Utc::now());
    }

    /// Empty the comment while keeping its id, parent, and children.
    pub fn tombstone(&mut self) {
        self.content = TOMBSTONE_CONTENT.to_string();
        self.deleted = true;
        self.updated_at = Some(Utc::now());
    }

    /// Whether the UI should offer a reply action under this comment.
    ///
    /// Replies may sit at most `max_reply_depth` levels below a top-level
    /// comment. The store itself accepts deeper replies.
    pub fn accepts_replies(&self, max_reply_depth: i32) -> bool {
        !self.deleted && self.depth < max_reply_depth
    }
}

/// What happens to the replies of a comment that is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Keep the comment as a `[deleted]` placeholder so its replies stay attached
    #[default]
    Tombstone,
    /// Delete the whole subtree
    Cascade,
}

impl FromStr for OrphanPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tombstone" => Ok(OrphanPolicy::Tombstone),
            "cascade" => Ok(OrphanPolicy::Cascade),
            other => Err(DomainError::InvalidArgument(format!(
                "unknown orphan policy: {other}"
            ))),
        }
    }
}

/// Result of a delete, used to invalidate caches and fan out change events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDeletion {
    /// Rows that no longer exist, including pruned tombstones
    pub removed: Vec<Comment>,
    /// Set when the target was kept as a tombstone
    pub tombstoned: Option<Comment>,
    /// Surviving ancestors whose `replies_count` changed
    pub updated_parents: Vec<Comment>,
}

impl CommentDeletion {
    pub fn removed_ids(&self) -> Vec<Snowflake> {
        self.removed.iter().map(|c| c.id).collect()
    }
}

/// Cursor page over top-level comments, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentPage {
    /// Only comments strictly older than this id
    pub before: Option<Snowflake>,
    pub limit: i64,
}

impl CommentPage {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(before: Option<Snowflake>, limit: i64) -> Self {
        Self {
            before,
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for CommentPage {
    fn default() -> Self {
        Self::new(None, Self::DEFAULT_LIMIT)
    }
}
