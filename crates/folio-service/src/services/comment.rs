//! Comment service
//!
//! Threaded comments on a project: create, edit, delete with the configured
//! orphan policy, and the cached read paths.

use folio_core::events::{CommentChangedEvent, CommentRemovedEvent};
use folio_core::{AuthContext, Comment, CommentPage, DomainError, DomainEvent, Snowflake};
use tracing::{info, instrument};

use crate::dto::{CommentPageView, CommentView, DeleteCommentOutcome};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::reaction::{require_actor, require_project_id};

/// Comment service
pub struct CommentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommentService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a top-level comment, or a reply when `parent_comment_id` is set
    #[instrument(skip(self, auth, content))]
    pub async fn add_comment(
        &self,
        auth: &AuthContext,
        project_id: Snowflake,
        content: &str,
        parent_comment_id: Option<Snowflake>,
    ) -> ServiceResult<CommentView> {
        let result = self
            .add_comment_inner(auth, project_id, content, parent_comment_id)
            .await;
        self.ctx.report(auth, &result, "Comment posted").await;
        result
    }

    async fn add_comment_inner(
        &self,
        auth: &AuthContext,
        project_id: Snowflake,
        content: &str,
        parent_comment_id: Option<Snowflake>,
    ) -> ServiceResult<CommentView> {
        let actor = require_actor(auth)?;
        require_project_id(project_id)?;
        let body = self.prepare_body(content)?;

        let (comment, parent) = match parent_comment_id {
            Some(parent_id) => {
                let parent = self.ctx.reader().find_comment(parent_id).await?;
                if parent.project_id != project_id {
                    return Err(DomainError::InvalidArgument(
                        "parent comment belongs to another project".to_string(),
                    )
                    .into());
                }
                if parent.is_tombstone() {
                    return Err(DomainError::InvalidArgument(
                        "Cannot reply to a deleted comment".to_string(),
                    )
                    .into());
                }
                let reply = Comment::new_reply(self.ctx.generate_id(), &parent, actor.user_id, body);
                (reply, Some(parent))
            }
            None => (
                Comment::new_top_level(self.ctx.generate_id(), project_id, actor.user_id, body),
                None,
            ),
        };

        let created = self.ctx.comment_repo().create(&comment).await?;

        info!(
            comment_id = %created.id,
            project_id = %project_id,
            user_id = %actor.user_id,
            depth = created.depth,
            "Comment created"
        );

        // Committed: from here on only caches and subscribers are updated,
        // and the bridge renders views itself, so nothing below can fail.
        if let Some(parent) = &parent {
            // The parent's replies_count changed too, and the parent sits in
            // its own parent's cached list.
            self.ctx.replies().invalidate(parent.id);
            if let Some(grandparent_id) = parent.parent_comment_id {
                self.ctx.replies().invalidate(grandparent_id);
            }
        }
        self.publish_added(&created).await;
        if let Some(parent) = &parent {
            self.publish_modified(parent).await;
        }

        Ok(self.ctx.reader().decorator().comment(&created).await)
    }

    /// Replace the body of a comment; author or moderator only
    #[instrument(skip(self, auth, content))]
    pub async fn edit_comment(
        &self,
        auth: &AuthContext,
        comment_id: Snowflake,
        content: &str,
    ) -> ServiceResult<CommentView> {
        let result = self.edit_comment_inner(auth, comment_id, content).await;
        self.ctx.report(auth, &result, "Comment updated").await;
        result
    }

    async fn edit_comment_inner(
        &self,
        auth: &AuthContext,
        comment_id: Snowflake,
        content: &str,
    ) -> ServiceResult<CommentView> {
        let actor = require_actor(auth)?;
        let existing = self.ctx.reader().find_comment(comment_id).await?;

        if !actor.can_edit_comment_of(existing.user_id) {
            return Err(DomainError::PermissionDenied(
                "You can only edit your own comments".to_string(),
            )
            .into());
        }
        if existing.is_tombstone() {
            return Err(
                DomainError::InvalidArgument("Deleted comments cannot be edited".to_string()).into(),
            );
        }

        let body = self.prepare_body(content)?;
        let updated = self
            .ctx
            .comment_repo()
            .update_content(comment_id, &body)
            .await?;

        info!(comment_id = %comment_id, editor_id = %actor.user_id, "Comment edited");

        if let Some(parent_id) = updated.parent_comment_id {
            self.ctx.replies().invalidate(parent_id);
        }
        self.publish_modified(&updated).await;

        Ok(self.ctx.reader().decorator().comment(&updated).await)
    }

    /// Delete a comment; author or moderator only
    ///
    /// A comment with replies needs `confirm`. What happens to those replies
    /// depends on the configured orphan policy.
    #[instrument(skip(self, auth))]
    pub async fn delete_comment(
        &self,
        auth: &AuthContext,
        comment_id: Snowflake,
        confirm: bool,
    ) -> ServiceResult<DeleteCommentOutcome> {
        let result = self.delete_comment_inner(auth, comment_id, confirm).await;
        self.ctx.report(auth, &result, "Comment deleted").await;
        result
    }

    async fn delete_comment_inner(
        &self,
        auth: &AuthContext,
        comment_id: Snowflake,
        confirm: bool,
    ) -> ServiceResult<DeleteCommentOutcome> {
        let actor = require_actor(auth)?;
        let existing = self.ctx.reader().find_comment(comment_id).await?;

        if !actor.can_delete_comment_of(existing.user_id) {
            return Err(DomainError::PermissionDenied(
                "You can only delete your own comments".to_string(),
            )
            .into());
        }
        if existing.is_tombstone() {
            return Err(DomainError::InvalidArgument(
                "Comment is already deleted".to_string(),
            )
            .into());
        }
        if existing.has_replies() && !confirm {
            return Err(DomainError::ConfirmationRequired {
                replies: existing.replies_count,
            }
            .into());
        }

        let policy = self.ctx.engagement().orphan_policy;
        let deletion = self.ctx.comment_repo().delete(comment_id, policy).await?;

        info!(
            comment_id = %comment_id,
            actor_id = %actor.user_id,
            policy = ?policy,
            removed = deletion.removed.len(),
            tombstoned = deletion.tombstoned.is_some(),
            "Comment deleted"
        );

        // Every list that contained a changed row, and every removed row's
        // own reply list.
        let replies = self.ctx.replies();
        for comment in &deletion.removed {
            replies.invalidate(comment.id);
        }
        replies.invalidate_many(
            deletion
                .removed
                .iter()
                .chain(deletion.tombstoned.iter())
                .chain(deletion.updated_parents.iter())
                .filter_map(|c| c.parent_comment_id),
        );

        for comment in &deletion.removed {
            self.ctx
                .bridge()
                .publish(DomainEvent::CommentRemoved(CommentRemovedEvent::new(
                    comment.project_id,
                    comment.id,
                    comment.parent_comment_id,
                )))
                .await;
        }
        for comment in deletion.tombstoned.iter().chain(&deletion.updated_parents) {
            self.publish_modified(comment).await;
        }

        let decorator = self.ctx.reader().decorator();
        let tombstoned = match &deletion.tombstoned {
            Some(comment) => Some(decorator.comment(comment).await),
            None => None,
        };
        Ok(DeleteCommentOutcome {
            removed: deletion.removed_ids(),
            tombstoned,
            updated_parents: decorator.comments(&deletion.updated_parents).await,
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Top-level comments of a project, newest first
    #[instrument(skip(self))]
    pub async fn list_top_level(
        &self,
        project_id: Snowflake,
        page: CommentPage,
    ) -> ServiceResult<CommentPageView> {
        require_project_id(project_id)?;
        self.ctx.reader().top_level(project_id, page).await
    }

    /// Direct replies of a comment, oldest first
    pub async fn get_replies(&self, parent_id: Snowflake) -> ServiceResult<Vec<CommentView>> {
        self.ctx.reader().replies(parent_id).await
    }

    pub async fn get_comment(&self, comment_id: Snowflake) -> ServiceResult<CommentView> {
        self.ctx.reader().comment(comment_id).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn prepare_body(&self, content: &str) -> ServiceResult<String> {
        if content.trim().is_empty() {
            return Err(DomainError::InvalidArgument("Comment cannot be empty".to_string()).into());
        }

        let validator = self.ctx.validator();
        let outcome = validator.validate(content);
        if !outcome.is_valid {
            let reason = outcome
                .reason
                .unwrap_or_else(|| "Comment was rejected".to_string());
            return Err(DomainError::ValidationFailed(reason).into());
        }

        let body = validator.sanitize(content);
        if body.is_empty() {
            return Err(DomainError::InvalidArgument("Comment cannot be empty".to_string()).into());
        }
        Ok(body)
    }

    async fn publish_added(&self, comment: &Comment) {
        self.ctx
            .bridge()
            .publish(DomainEvent::CommentAdded(CommentChangedEvent::new(
                comment.project_id,
                comment.id,
                comment.parent_comment_id,
            )))
            .await;
    }

    async fn publish_modified(&self, comment: &Comment) {
        self.ctx
            .bridge()
            .publish(DomainEvent::CommentModified(CommentChangedEvent::new(
                comment.project_id,
                comment.id,
                comment.parent_comment_id,
            )))
            .await;
    }
}
