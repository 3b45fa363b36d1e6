//! Response DTOs for API endpoints and realtime views
//!
//! All response DTOs implement `Serialize` for JSON output and `Deserialize`
//! so WebSocket clients and tests can read them back.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use folio_core::{Profile, ReactionAggregate, ReactionState, ReactionType, Snowflake};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Common Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub store: String,
    pub relay: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ReadinessResponse {
    /// `relay_ok` is `None` when no relay is configured
    pub fn new(store_ok: bool, relay_ok: Option<bool>) -> Self {
        let ready = store_ok && relay_ok != Some(false);
        let check = |ok: bool| if ok { "ok" } else { "unavailable" }.to_string();
        Self {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                store: check(store_ok),
                relay: relay_ok.map_or_else(|| "disabled".to_string(), check),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

// ============================================================================
// Profile Responses
// ============================================================================

/// Display data of a comment author or reactor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: Snowflake,
    pub name: String,
    pub avatar: String,
}

impl From<Profile> for AuthorView {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user_id,
            name: profile.name,
            avatar: profile.avatar,
        }
    }
}

// ============================================================================
// Reaction Responses
// ============================================================================

/// Counters of a project, plus the viewer's own reaction when known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummaryView {
    pub project_id: Snowflake,
    pub counts: BTreeMap<ReactionType, i64>,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub viewer_reaction: Option<ReactionType>,
}

impl ReactionSummaryView {
    pub fn new(aggregate: ReactionAggregate, viewer_reaction: Option<ReactionType>) -> Self {
        Self {
            project_id: aggregate.project_id,
            counts: aggregate.counts,
            total: aggregate.total,
            viewer_reaction,
        }
    }
}

/// Result of a toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleView {
    pub state: ReactionState,
    pub summary: ReactionSummaryView,
}

/// One user's reaction on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorView {
    pub user: AuthorView,
    pub reaction_type: ReactionType,
    pub reacted_at: DateTime<Utc>,
}

// ============================================================================
// Comment Responses
// ============================================================================

/// A comment decorated with its author's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Snowflake,
    pub project_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_comment_id: Option<Snowflake>,
    pub depth: i32,
    pub content: String,
    /// Absent for deleted comments
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<AuthorView>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub edited: bool,
    pub replies_count: i32,
    pub deleted: bool,
    /// Whether the UI should offer a reply action
    pub can_reply: bool,
}

/// One page of top-level comments, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPageView {
    pub comments: Vec<CommentView>,
    /// Pass as `before` to fetch the next page; absent on the last page
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_before: Option<Snowflake>,
}

/// What a delete did to the thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCommentOutcome {
    /// Comments that no longer exist, including pruned placeholders
    pub removed: Vec<Snowflake>,
    /// The target, when it was kept as a `[deleted]` placeholder
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tombstoned: Option<CommentView>,
    /// Surviving ancestors whose reply count changed
    pub updated_parents: Vec<CommentView>,
}
