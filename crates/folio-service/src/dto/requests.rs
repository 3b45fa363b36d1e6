//! Request DTOs for API endpoints
//!
//! Bodies implement `Deserialize` and `Validate`. Length rules that depend on
//! configuration are enforced by the content validator, so the limits here
//! only reject absurd payloads.

use folio_core::{CommentPage, Snowflake};
use serde::Deserialize;
use validator::Validate;

/// Upper bound on any comment body accepted off the wire
pub const MAX_BODY_CHARS: u64 = 20_000;

// ============================================================================
// Reaction Requests
// ============================================================================

/// Toggle a reaction on a project
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleReactionRequest {
    /// Missing or empty types are rejected by the service
    #[serde(default)]
    #[validate(length(max = 32, message = "Reaction type is too long"))]
    pub reaction_type: String,
}

/// Query for the reactor list
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReactorsQuery {
    #[serde(default, rename = "type")]
    pub reaction_type: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl ReactorsQuery {
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

// ============================================================================
// Comment Requests
// ============================================================================

/// Create a comment or a reply
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(length(max = MAX_BODY_CHARS, message = "Comment is too long"))]
    pub content: String,

    /// Reply target; absent for a top-level comment
    #[serde(default)]
    pub parent_comment_id: Option<Snowflake>,
}

/// Replace a comment's body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    #[validate(length(max = MAX_BODY_CHARS, message = "Comment is too long"))]
    pub content: String,
}

/// Query for deleting a comment
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct DeleteCommentQuery {
    /// Required when the comment still has replies
    #[serde(default)]
    pub confirm: bool,
}

/// Cursor query over top-level comments
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentPageQuery {
    /// Only comments older than this id (Snowflake as string)
    pub before: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl CommentPageQuery {
    /// Parse into a page; an unparsable cursor is treated as absent
    pub fn page(&self) -> CommentPage {
        let before = self.before.as_deref().and_then(|s| s.parse::<Snowflake>().ok());
        CommentPage::new(before, self.limit.unwrap_or(CommentPage::DEFAULT_LIMIT))
    }
}
