//! Test fixtures and data generators
//!
//! Request bodies and unique ids for integration tests. Responses are read
//! back into the service DTOs.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// Counter for unique project and user ids
static COUNTER: AtomicI64 = AtomicI64::new(1_000);

/// A project id no other test uses
pub fn unique_project_id() -> i64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A user id no other test uses
pub fn unique_user_id() -> i64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Toggle request
#[derive(Debug, Serialize)]
pub struct ToggleRequest {
    pub reaction_type: String,
}

impl ToggleRequest {
    pub fn new(reaction_type: &str) -> Self {
        Self {
            reaction_type: reaction_type.to_string(),
        }
    }
}

/// Create comment request
#[derive(Debug, Serialize)]
pub struct NewComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

impl NewComment {
    pub fn top_level(content: &str) -> Self {
        Self {
            content: content.to_string(),
            parent_comment_id: None,
        }
    }

    pub fn reply(parent_comment_id: impl ToString, content: &str) -> Self {
        Self {
            content: content.to_string(),
            parent_comment_id: Some(parent_comment_id.to_string()),
        }
    }
}

/// Edit comment request
#[derive(Debug, Serialize)]
pub struct EditComment {
    pub content: String,
}

impl EditComment {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

/// Path of a project's reactions
pub fn reactions_path(project_id: i64) -> String {
    format!("/api/v1/projects/{project_id}/reactions")
}

/// Path of a project's comments
pub fn comments_path(project_id: i64) -> String {
    format!("/api/v1/projects/{project_id}/comments")
}

/// Path of one comment
pub fn comment_path(comment_id: impl std::fmt::Display) -> String {
    format!("/api/v1/comments/{comment_id}")
}
