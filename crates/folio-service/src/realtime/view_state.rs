//! Client-side model of one project, kept current from change events

use folio_core::{ChangeKind, EntityKind, Snowflake};
use std::collections::BTreeMap;

use super::events::{ChangeEvent, ViewPayload};
use crate::dto::{CommentView, ReactionSummaryView};

/// Everything a subscriber has learned about a project
///
/// Every [`ViewPayload`] carries full state, so [`apply`](Self::apply) simply
/// overwrites. Sequence numbers are monotonic per publishing bridge, and a
/// state follows one bridge: an event at or below `last_seq` is a duplicate
/// or arrived late behind newer state, and is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectViewState {
    pub project_id: Option<Snowflake>,
    pub reactions: Option<ReactionSummaryView>,
    pub comments: BTreeMap<Snowflake, CommentView>,
    /// Sequence number of the last applied event
    pub last_seq: u64,
}

impl ProjectViewState {
    pub fn new(project_id: Snowflake) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    /// Seed from an initial fetch
    pub fn with_snapshot(
        project_id: Snowflake,
        reactions: ReactionSummaryView,
        comments: impl IntoIterator<Item = CommentView>,
    ) -> Self {
        let mut state = Self::new(project_id);
        state.reactions = Some(reactions);
        state.upsert_all(comments);
        state
    }

    /// Merge one change event; returns whether the state changed
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        if self.project_id.is_some_and(|id| id != event.project_id) {
            return false;
        }

        if event.seq <= self.last_seq {
            return false;
        }

        let before = self.clone();
        self.last_seq = event.seq;

        if event.kind == ChangeKind::Removed && event.entity == EntityKind::Comment {
            self.comments.remove(&event.entity_id);
        }

        match &event.view {
            Some(ViewPayload::Reactions(change)) => {
                // The summary is broadcast without a viewer; keep the one we know.
                let viewer_reaction = self.reactions.as_ref().and_then(|r| r.viewer_reaction);
                let mut summary = change.summary.clone();
                summary.viewer_reaction = viewer_reaction;
                self.reactions = Some(summary);
            }
            Some(ViewPayload::Comment(view)) => {
                self.comments.insert(view.id, view.clone());
            }
            Some(ViewPayload::Thread(thread)) => {
                if let Some(parent) = &thread.parent {
                    self.comments.insert(parent.id, parent.clone());
                }
                self.upsert_all(thread.comments.iter().cloned());
            }
            None => {}
        }

        *self != before
    }

    /// Top-level comments, newest first
    pub fn top_level(&self) -> Vec<&CommentView> {
        let mut list: Vec<&CommentView> = self
            .comments
            .values()
            .filter(|c| c.parent_comment_id.is_none())
            .collect();
        list.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        list
    }

    /// Known replies of a comment, oldest first
    pub fn replies_of(&self, parent_id: Snowflake) -> Vec<&CommentView> {
        let mut list: Vec<&CommentView> = self
            .comments
            .values()
            .filter(|c| c.parent_comment_id == Some(parent_id))
            .collect();
        list.sort_by_key(|c| (c.created_at, c.id));
        list
    }

    fn upsert_all(&mut self, comments: impl IntoIterator<Item = CommentView>) {
        for comment in comments {
            self.comments.insert(comment.id, comment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::events::{ReactionChangeView, ThreadView};
    use chrono::Utc;
    use folio_core::{ReactionAggregate, ReactionType};

    const PROJECT: Snowflake = Snowflake::new(1);

    fn comment(id: i64, parent: Option<i64>) -> CommentView {
        CommentView {
            id: Snowflake::new(id),
            project_id: PROJECT,
            parent_comment_id: parent.map(Snowflake::new),
            depth: i32::from(parent.is_some()),
            content: format!("comment {id}"),
            author: None,
            created_at: Utc::now(),
            updated_at: None,
            edited: false,
            replies_count: 0,
            deleted: false,
            can_reply: true,
        }
    }

    fn event(
        seq: u64,
        kind: ChangeKind,
        entity: EntityKind,
        id: i64,
        view: Option<ViewPayload>,
    ) -> ChangeEvent {
        ChangeEvent {
            seq,
            project_id: PROJECT,
            event_type: "TEST".to_string(),
            kind,
            entity,
            entity_id: Snowflake::new(id),
            view,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent() {
        let mut state = ProjectViewState::new(PROJECT);
        let added = event(
            1,
            ChangeKind::Added,
            EntityKind::Comment,
            10,
            Some(ViewPayload::Comment(comment(10, None))),
        );

        assert!(state.apply(&added));
        let once = state.clone();
        assert!(!state.apply(&added));
        assert_eq!(state, once);
    }

    #[test]
    fn test_late_event_does_not_overwrite_newer_state() {
        let mut state = ProjectViewState::new(PROJECT);
        let mut edited = comment(10, None);
        edited.content = "edited".to_string();
        edited.edited = true;

        let newer = event(
            5,
            ChangeKind::Modified,
            EntityKind::Comment,
            10,
            Some(ViewPayload::Comment(edited)),
        );
        let older = event(
            4,
            ChangeKind::Added,
            EntityKind::Comment,
            10,
            Some(ViewPayload::Comment(comment(10, None))),
        );

        assert!(state.apply(&newer));
        assert!(!state.apply(&older));
        assert_eq!(state.comments[&Snowflake::new(10)].content, "edited");
        assert_eq!(state.last_seq, 5);
    }

    #[test]
    fn test_removal_replaces_thread() {
        let mut parent = comment(10, None);
        let reply = comment(11, Some(10));
        let summary = ReactionSummaryView::new(ReactionAggregate::empty(PROJECT), None);
        let mut state = ProjectViewState::with_snapshot(PROJECT, summary, [parent.clone(), reply]);
        assert_eq!(state.replies_of(Snowflake::new(10)).len(), 1);

        parent.replies_count = 0;
        let removed = event(
            2,
            ChangeKind::Removed,
            EntityKind::Comment,
            11,
            Some(ViewPayload::Thread(ThreadView {
                parent_comment_id: Some(parent.id),
                parent: Some(parent),
                comments: Vec::new(),
            })),
        );

        assert!(state.apply(&removed));
        assert!(state.replies_of(Snowflake::new(10)).is_empty());
        assert_eq!(state.comments[&Snowflake::new(10)].replies_count, 0);
        assert_eq!(state.last_seq, 2);
    }

    #[test]
    fn test_reaction_summary_keeps_viewer_reaction() {
        let mut state = ProjectViewState::with_snapshot(
            PROJECT,
            ReactionSummaryView::new(ReactionAggregate::empty(PROJECT), Some(ReactionType::Fire)),
            [],
        );

        let mut aggregate = ReactionAggregate::empty(PROJECT);
        aggregate.counts.insert(ReactionType::Like, 1);
        aggregate.total = 1;
        let change = event(
            3,
            ChangeKind::Added,
            EntityKind::Reaction,
            99,
            Some(ViewPayload::Reactions(ReactionChangeView {
                summary: ReactionSummaryView::new(aggregate, None),
                user: None,
                previous: None,
                current: Some(ReactionType::Like),
            })),
        );

        assert!(state.apply(&change));
        let reactions = state.reactions.as_ref().unwrap();
        assert_eq!(reactions.total, 1);
        assert_eq!(reactions.viewer_reaction, Some(ReactionType::Fire));
    }

    #[test]
    fn test_other_projects_are_ignored() {
        let mut state = ProjectViewState::new(Snowflake::new(2));
        let added = event(
            1,
            ChangeKind::Added,
            EntityKind::Comment,
            10,
            Some(ViewPayload::Comment(comment(10, None))),
        );
        assert!(!state.apply(&added));
    }
}
