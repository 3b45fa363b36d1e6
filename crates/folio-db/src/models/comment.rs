//! Comment database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for comments table
#[derive(Debug, Clone, FromRow)]
pub struct CommentModel {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub content: String,
    pub parent_comment_id: Option<i64>,
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub replies_count: i32,
    pub deleted: bool,
}

impl CommentModel {
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }
}
