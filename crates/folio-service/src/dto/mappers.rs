//! Entity to DTO mappers
//!
//! Comments and reactions are decorated with author profiles here, always via
//! the profile cache's batch path.

use folio_cache::ProfileCache;
use folio_core::{Comment, Profile, Reaction, Snowflake};
use std::collections::HashMap;
use std::sync::Arc;

use super::responses::{AuthorView, CommentView, ReactorView};

// ============================================================================
// Comment Mappers
// ============================================================================

impl CommentView {
    /// Build the view from an entity and an already-fetched author profile
    pub fn from_parts(comment: &Comment, author: Option<Profile>, max_reply_depth: i32) -> Self {
        let author = if comment.is_tombstone() {
            None
        } else {
            author.map(AuthorView::from)
        };

        Self {
            id: comment.id,
            project_id: comment.project_id,
            parent_comment_id: comment.parent_comment_id,
            depth: comment.depth,
            content: comment.content.clone(),
            author,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            edited: comment.is_edited() && !comment.is_tombstone(),
            replies_count: comment.replies_count,
            deleted: comment.deleted,
            can_reply: comment.accepts_replies(max_reply_depth),
        }
    }
}

// ============================================================================
// Decorator
// ============================================================================

/// Turns entities into client views, resolving authors through the cache
#[derive(Debug, Clone)]
pub struct ViewDecorator {
    profiles: Arc<ProfileCache>,
    max_reply_depth: i32,
}

impl ViewDecorator {
    pub fn new(profiles: Arc<ProfileCache>, max_reply_depth: i32) -> Self {
        Self {
            profiles,
            max_reply_depth,
        }
    }

    pub fn profiles(&self) -> &ProfileCache {
        &self.profiles
    }

    pub fn max_reply_depth(&self) -> i32 {
        self.max_reply_depth
    }

    pub async fn comment(&self, comment: &Comment) -> CommentView {
        let author = if comment.is_tombstone() {
            None
        } else {
            Some(self.profiles.get(comment.user_id).await)
        };
        CommentView::from_parts(comment, author, self.max_reply_depth)
    }

    /// Decorate a list, keeping its order; authors are fetched in one batch
    pub async fn comments(&self, comments: &[Comment]) -> Vec<CommentView> {
        let authors: Vec<Snowflake> = comments
            .iter()
            .filter(|c| !c.is_tombstone())
            .map(|c| c.user_id)
            .collect();
        let profiles = self.profiles.get_many(&authors).await;

        comments
            .iter()
            .map(|c| {
                let author = (!c.is_tombstone()).then(|| {
                    profiles
                        .get(&c.user_id)
                        .cloned()
                        .unwrap_or_else(|| Profile::placeholder(c.user_id))
                });
                CommentView::from_parts(c, author, self.max_reply_depth)
            })
            .collect()
    }

    pub async fn reactors(&self, reactions: &[Reaction]) -> Vec<ReactorView> {
        let users: Vec<Snowflake> = reactions.iter().map(|r| r.user_id).collect();
        let profiles: HashMap<Snowflake, Profile> = self.profiles.get_many(&users).await;

        reactions
            .iter()
            .map(|r| ReactorView {
                user: profiles
                    .get(&r.user_id)
                    .cloned()
                    .unwrap_or_else(|| Profile::placeholder(r.user_id))
                    .into(),
                reaction_type: r.reaction_type,
                reacted_at: r.created_at,
            })
            .collect()
    }
}
