//! Change events delivered to realtime subscribers

use chrono::{DateTime, Utc};
use folio_core::{ChangeKind, DomainEvent, EntityKind, ReactionType, Snowflake};
use serde::{Deserialize, Serialize};

use crate::dto::{AuthorView, CommentView, ReactionSummaryView};

/// Pub/Sub event type used when relaying change events between processes
pub const CHANGE_EVENT_TYPE: &str = "CHANGE";

/// One committed mutation, with the recomputed view of what it touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Monotonic per publishing bridge
    pub seq: u64,
    pub project_id: Snowflake,
    /// Domain event name, e.g. `COMMENT_ADDED`
    pub event_type: String,
    pub kind: ChangeKind,
    pub entity: EntityKind,
    pub entity_id: Snowflake,
    /// Full current state of the affected view; absent when it could not be
    /// recomputed, in which case subscribers should refetch
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub view: Option<ViewPayload>,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(seq: u64, event: &DomainEvent, view: Option<ViewPayload>) -> Self {
        Self {
            seq,
            project_id: event.project_id(),
            event_type: event.event_type().to_string(),
            kind: event.kind(),
            entity: event.entity(),
            entity_id: event.entity_id(),
            view,
            timestamp: event.timestamp(),
        }
    }
}

/// Recomputed state carried by a [`ChangeEvent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ViewPayload {
    /// Project counters after a toggle or recount
    Reactions(ReactionChangeView),
    /// A comment that was added or changed
    Comment(CommentView),
    /// The list a comment was removed from
    Thread(ThreadView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionChangeView {
    pub summary: ReactionSummaryView,
    /// Who toggled; absent for a recount
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<AuthorView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous: Option<ReactionType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current: Option<ReactionType>,
}

/// Replies of a parent, or the first page of top-level comments when
/// `parent_comment_id` is absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadView {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_comment_id: Option<Snowflake>,
    /// Current state of the parent; absent for top-level lists or when the
    /// parent itself is gone
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<CommentView>,
    pub comments: Vec<CommentView>,
}
