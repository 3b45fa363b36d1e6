//! Domain events - emitted after a ledger or comment-tree mutation commits
//!
//! The realtime bridge consumes these, recomputes the affected view, and
//! fans it out to every subscriber of the project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ReactionTransition, ReactionType, TransitionKind};
use crate::value_objects::Snowflake;

/// Coarse change classification delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// Which kind of record changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Reaction,
    Comment,
}

/// All possible domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    // =========================================================================
    // Reaction Events
    // =========================================================================
    ReactionAdded(ReactionChangedEvent),
    ReactionModified(ReactionChangedEvent),
    ReactionRemoved(ReactionChangedEvent),
    CountersReconciled(CountersReconciledEvent),

    // =========================================================================
    // Comment Events
    // =========================================================================
    CommentAdded(CommentChangedEvent),
    CommentModified(CommentChangedEvent),
    CommentRemoved(CommentRemovedEvent),
}

impl DomainEvent {
    /// Map a committed toggle onto the matching reaction event
    pub fn from_transition(
        project_id: Snowflake,
        user_id: Snowflake,
        transition: &ReactionTransition,
    ) -> Self {
        let payload = ReactionChangedEvent {
            project_id,
            user_id,
            previous: transition.from.reaction_type(),
            current: transition.to.reaction_type(),
            timestamp: Utc::now(),
        };
        match transition.kind() {
            TransitionKind::Added => Self::ReactionAdded(payload),
            TransitionKind::Replaced => Self::ReactionModified(payload),
            TransitionKind::Removed => Self::ReactionRemoved(payload),
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ReactionAdded(_) => "REACTION_ADDED",
            Self::ReactionModified(_) => "REACTION_MODIFIED",
            Self::ReactionRemoved(_) => "REACTION_REMOVED",
            Self::CountersReconciled(_) => "COUNTERS_RECONCILED",
            Self::CommentAdded(_) => "COMMENT_ADDED",
            Self::CommentModified(_) => "COMMENT_MODIFIED",
            Self::CommentRemoved(_) => "COMMENT_REMOVED",
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::ReactionAdded(_) | Self::CommentAdded(_) => ChangeKind::Added,
            Self::ReactionModified(_) | Self::CountersReconciled(_) | Self::CommentModified(_) => {
                ChangeKind::Modified
            }
            Self::ReactionRemoved(_) | Self::CommentRemoved(_) => ChangeKind::Removed,
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Self::ReactionAdded(_)
            | Self::ReactionModified(_)
            | Self::ReactionRemoved(_)
            | Self::CountersReconciled(_) => EntityKind::Reaction,
            Self::CommentAdded(_) | Self::CommentModified(_) | Self::CommentRemoved(_) => {
                EntityKind::Comment
            }
        }
    }

    pub fn project_id(&self) -> Snowflake {
        match self {
            Self::ReactionAdded(e) | Self::ReactionModified(e) | Self::ReactionRemoved(e) => {
                e.project_id
            }
            Self::CountersReconciled(e) => e.project_id,
            Self::CommentAdded(e) | Self::CommentModified(e) => e.project_id,
            Self::CommentRemoved(e) => e.project_id,
        }
    }

    /// Id of the changed record; reaction events use the reacting user's id
    /// since a user holds at most one reaction per project.
    pub fn entity_id(&self) -> Snowflake {
        match self {
            Self::ReactionAdded(e) | Self::ReactionModified(e) | Self::ReactionRemoved(e) => {
                e.user_id
            }
            Self::CountersReconciled(e) => e.project_id,
            Self::CommentAdded(e) | Self::CommentModified(e) => e.comment_id,
            Self::CommentRemoved(e) => e.comment_id,
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ReactionAdded(e) | Self::ReactionModified(e) | Self::ReactionRemoved(e) => {
                e.timestamp
            }
            Self::CountersReconciled(e) => e.timestamp,
            Self::CommentAdded(e) | Self::CommentModified(e) => e.timestamp,
            Self::CommentRemoved(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionChangedEvent {
    pub project_id: Snowflake,
    pub user_id: Snowflake,
    pub previous: Option<ReactionType>,
    pub current: Option<ReactionType>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountersReconciledEvent {
    pub project_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

impl CountersReconciledEvent {
    pub fn new(project_id: Snowflake) -> Self {
        Self {
            project_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentChangedEvent {
    pub project_id: Snowflake,
    pub comment_id: Snowflake,
    pub parent_comment_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

impl CommentChangedEvent {
    pub fn new(
        project_id: Snowflake,
        comment_id: Snowflake,
        parent_comment_id: Option<Snowflake>,
    ) -> Self {
        Self {
            project_id,
            comment_id,
            parent_comment_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRemovedEvent {
    pub project_id: Snowflake,
    pub comment_id: Snowflake,
    pub parent_comment_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

impl CommentRemovedEvent {
    pub fn new(
        project_id: Snowflake,
        comment_id: Snowflake,
        parent_comment_id: Option<Snowflake>,
    ) -> Self {
        Self {
            project_id,
            comment_id,
            parent_comment_id,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ReactionState;

    #[test]
    fn test_event_serialization() {
        let event = DomainEvent::CommentAdded(CommentChangedEvent::new(
            Snowflake::new(1),
            Snowflake::new(2),
            None,
        ));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("COMMENT_ADDED"));

        let parsed: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type(), "COMMENT_ADDED");
        assert_eq!(parsed.kind(), ChangeKind::Added);
        assert_eq!(parsed.entity(), EntityKind::Comment);
    }

    #[test]
    fn test_from_transition_kinds() {
        let project = Snowflake::new(1);
        let user = Snowflake::new(2);

        let added = ReactionState::None.toggle(ReactionType::Like);
        let replaced = ReactionState::Reacted(ReactionType::Like).toggle(ReactionType::Love);
        let removed = ReactionState::Reacted(ReactionType::Love).toggle(ReactionType::Love);

        assert_eq!(
            DomainEvent::from_transition(project, user, &added).kind(),
            ChangeKind::Added
        );
        assert_eq!(
            DomainEvent::from_transition(project, user, &replaced).kind(),
            ChangeKind::Modified
        );
        let event = DomainEvent::from_transition(project, user, &removed);
        assert_eq!(event.kind(), ChangeKind::Removed);
        assert_eq!(event.entity_id(), user);
        assert_eq!(event.project_id(), project);
    }
}
