//! Read paths shared by the services and the realtime bridge
//!
//! Every view a client sees, whether from a request or a change event, is
//! built here so both paths go through the same caches.

use std::sync::Arc;

use folio_cache::ReplyCache;
use folio_core::{
    Comment, CommentPage, CommentRepository, DomainError, ProjectRepository, ReactionLedger,
    Snowflake,
};
use tracing::{debug, instrument};

use crate::dto::{CommentPageView, CommentView, ReactionSummaryView, ViewDecorator};

use super::error::ServiceResult;

#[derive(Clone)]
pub struct EngagementReader {
    ledger: Arc<dyn ReactionLedger>,
    comments: Arc<dyn CommentRepository>,
    projects: Arc<dyn ProjectRepository>,
    replies: Arc<ReplyCache>,
    decorator: ViewDecorator,
}

impl std::fmt::Debug for EngagementReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementReader")
            .field("replies", &self.replies.len())
            .field("decorator", &self.decorator)
            .finish_non_exhaustive()
    }
}

impl EngagementReader {
    pub fn new(
        ledger: Arc<dyn ReactionLedger>,
        comments: Arc<dyn CommentRepository>,
        projects: Arc<dyn ProjectRepository>,
        replies: Arc<ReplyCache>,
        decorator: ViewDecorator,
    ) -> Self {
        Self {
            ledger,
            comments,
            projects,
            replies,
            decorator,
        }
    }

    pub fn decorator(&self) -> &ViewDecorator {
        &self.decorator
    }

    /// Counters of a project, with `viewer`'s own reaction when given
    pub async fn summary(
        &self,
        project_id: Snowflake,
        viewer: Option<Snowflake>,
    ) -> ServiceResult<ReactionSummaryView> {
        let aggregate = self.ledger.aggregate(project_id).await?;
        let viewer_reaction = match viewer {
            Some(user_id) => self
                .ledger
                .find(project_id, user_id)
                .await?
                .map(|r| r.reaction_type),
            None => None,
        };
        Ok(ReactionSummaryView::new(aggregate, viewer_reaction))
    }

    pub async fn find_comment(&self, comment_id: Snowflake) -> ServiceResult<Comment> {
        Ok(self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or(DomainError::CommentNotFound(comment_id))?)
    }

    pub async fn comment(&self, comment_id: Snowflake) -> ServiceResult<CommentView> {
        let comment = self.find_comment(comment_id).await?;
        Ok(self.decorator.comment(&comment).await)
    }

    /// Direct replies of `parent_id`, oldest first, through the reply cache
    #[instrument(skip(self))]
    pub async fn replies(&self, parent_id: Snowflake) -> ServiceResult<Vec<CommentView>> {
        if let Some(cached) = self.replies.get(parent_id) {
            debug!(parent_id = %parent_id, "Reply cache hit");
            return Ok(self.decorator.comments(&cached).await);
        }

        // Taken before the read so an invalidation racing with it wins.
        let ticket = self.replies.ticket(parent_id);
        self.find_comment(parent_id).await?;
        let replies = self.comments.find_replies(parent_id).await?;
        let views = self.decorator.comments(&replies).await;
        self.replies.fill(ticket, replies);
        Ok(views)
    }

    /// One page of a project's top-level comments, newest first
    pub async fn top_level(
        &self,
        project_id: Snowflake,
        page: CommentPage,
    ) -> ServiceResult<CommentPageView> {
        if !self.projects.exists(project_id).await? {
            return Err(DomainError::ProjectNotFound(project_id).into());
        }

        let comments = self.comments.find_top_level(project_id, page).await?;
        let next_before = if comments.len() as i64 >= page.limit {
            comments.last().map(|c| c.id)
        } else {
            None
        };

        Ok(CommentPageView {
            comments: self.decorator.comments(&comments).await,
            next_before,
        })
    }
}
