//! Reaction service
//!
//! Toggles a user's single reaction on a project and serves counters and
//! reactor lists.

use folio_core::events::CountersReconciledEvent;
use folio_core::{
    Actor, AuthContext, Capabilities, DomainError, DomainEvent, ReactionType, Snowflake,
    ToggleRequest,
};
use tracing::{info, instrument};

use crate::dto::{ReactionSummaryView, ReactorView, ToggleView};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Reaction service
pub struct ReactionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// One step of the toggle state machine for the caller on `project_id`
    ///
    /// Same type as the current reaction removes it, a different type
    /// replaces it, no reaction adds one.
    #[instrument(skip(self, auth))]
    pub async fn toggle(
        &self,
        auth: &AuthContext,
        project_id: Snowflake,
        reaction_type: &str,
    ) -> ServiceResult<ToggleView> {
        let result = self.toggle_inner(auth, project_id, reaction_type).await;
        self.ctx.report(auth, &result, "Reaction saved").await;
        result
    }

    async fn toggle_inner(
        &self,
        auth: &AuthContext,
        project_id: Snowflake,
        reaction_type: &str,
    ) -> ServiceResult<ToggleView> {
        let actor = require_actor(auth)?;
        require_project_id(project_id)?;
        let reaction_type: ReactionType = reaction_type.parse()?;

        let outcome = self
            .ctx
            .ledger()
            .toggle(ToggleRequest {
                reaction_id: self.ctx.generate_id(),
                project_id,
                user_id: actor.user_id,
                reaction_type,
            })
            .await?;

        info!(
            project_id = %project_id,
            user_id = %actor.user_id,
            transition = ?outcome.transition.kind(),
            total = outcome.aggregate.total,
            "Reaction toggled"
        );

        self.ctx
            .bridge()
            .publish(DomainEvent::from_transition(
                project_id,
                actor.user_id,
                &outcome.transition,
            ))
            .await;

        let state = outcome.transition.to;
        Ok(ToggleView {
            state,
            summary: ReactionSummaryView::new(outcome.aggregate, state.reaction_type()),
        })
    }

    /// Counters of a project plus the viewer's own reaction, if signed in
    #[instrument(skip(self, viewer))]
    pub async fn summary(
        &self,
        project_id: Snowflake,
        viewer: &AuthContext,
    ) -> ServiceResult<ReactionSummaryView> {
        require_project_id(project_id)?;
        self.ctx.reader().summary(project_id, viewer.user_id()).await
    }

    /// Who reacted, oldest first, optionally only with one type
    #[instrument(skip(self))]
    pub async fn reactors(
        &self,
        project_id: Snowflake,
        reaction_type: Option<&str>,
        limit: i64,
    ) -> ServiceResult<Vec<ReactorView>> {
        require_project_id(project_id)?;
        let reaction_type = reaction_type
            .map(str::parse::<ReactionType>)
            .transpose()?;

        if !self.ctx.project_repo().exists(project_id).await? {
            return Err(DomainError::ProjectNotFound(project_id).into());
        }

        let reactions = self
            .ctx
            .ledger()
            .find_by_project(project_id, reaction_type, limit.clamp(1, 100))
            .await?;
        Ok(self.ctx.reader().decorator().reactors(&reactions).await)
    }

    /// Rebuild a project's counters from its ledger rows
    ///
    /// Requires [`Capabilities::RECONCILE_COUNTERS`], which only admins hold.
    #[instrument(skip(self, auth))]
    pub async fn reconcile(
        &self,
        auth: &AuthContext,
        project_id: Snowflake,
    ) -> ServiceResult<ReactionSummaryView> {
        let result = self.reconcile_inner(auth, project_id).await;
        self.ctx.report(auth, &result, "Counters rebuilt").await;
        result
    }

    async fn reconcile_inner(
        &self,
        auth: &AuthContext,
        project_id: Snowflake,
    ) -> ServiceResult<ReactionSummaryView> {
        let actor = require_actor(auth)?;
        if !actor.can(Capabilities::RECONCILE_COUNTERS) {
            return Err(DomainError::PermissionDenied(
                "Only admins can rebuild counters".to_string(),
            )
            .into());
        }
        require_project_id(project_id)?;

        let before = self.ctx.ledger().aggregate(project_id).await?;
        let after = self.ctx.ledger().reconcile(project_id).await?;

        info!(
            project_id = %project_id,
            admin_id = %actor.user_id,
            total_before = before.total,
            total_after = after.total,
            repaired = before != after,
            "Reaction counters reconciled"
        );

        self.ctx
            .bridge()
            .publish(DomainEvent::CountersReconciled(CountersReconciledEvent::new(
                project_id,
            )))
            .await;

        Ok(ReactionSummaryView::new(after, None))
    }
}

pub(crate) fn require_actor(auth: &AuthContext) -> Result<&Actor, DomainError> {
    auth.actor().ok_or(DomainError::AuthRequired)
}

pub(crate) fn require_project_id(project_id: Snowflake) -> Result<(), DomainError> {
    if project_id.is_zero() {
        return Err(DomainError::InvalidArgument(
            "project id is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::MemoryNotificationSink;
    use crate::services::{ServiceContextBuilder, ServiceError};
    use folio_common::JwtService;
    use folio_core::{NotificationLevel, ReactionAggregate, ReactionState, Role};
    use folio_db::MemoryStore;
    use std::sync::Arc;

    const PROJECT: Snowflake = Snowflake::new(100);

    fn setup() -> (ServiceContext, MemoryStore, MemoryNotificationSink) {
        let store = MemoryStore::new();
        store.insert_project(PROJECT);
        let sink = MemoryNotificationSink::new();
        let ctx = ServiceContextBuilder::new()
            .memory_store(store.clone())
            .notifier(Arc::new(sink.clone()))
            .jwt_service(Arc::new(JwtService::new("test-secret", 60)))
            .build()
            .unwrap();
        (ctx, store, sink)
    }

    fn user(id: i64) -> AuthContext {
        Actor::member(Snowflake::new(id)).into()
    }

    #[tokio::test]
    async fn test_toggle_cycle() {
        let (ctx, _, _) = setup();
        let service = ReactionService::new(&ctx);
        let ada = user(1);

        let added = service.toggle(&ada, PROJECT, "like").await.unwrap();
        assert_eq!(added.state, ReactionState::Reacted(ReactionType::Like));
        assert_eq!(added.summary.total, 1);
        assert_eq!(added.summary.viewer_reaction, Some(ReactionType::Like));

        let replaced = service.toggle(&ada, PROJECT, "love").await.unwrap();
        assert_eq!(replaced.summary.total, 1);
        assert_eq!(replaced.summary.counts[&ReactionType::Like], 0);
        assert_eq!(replaced.summary.counts[&ReactionType::Love], 1);

        let removed = service.toggle(&ada, PROJECT, "love").await.unwrap();
        assert_eq!(removed.state, ReactionState::None);
        assert_eq!(removed.summary.total, 0);
        assert!(removed.summary.viewer_reaction.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_toggle_is_rejected_and_notified() {
        let (ctx, _, sink) = setup();
        let err = ReactionService::new(&ctx)
            .toggle(&AuthContext::Anonymous, PROJECT, "like")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(DomainError::AuthRequired)));
        let note = sink.last().unwrap();
        assert_eq!(note.level, NotificationLevel::Failure);
        assert_eq!(note.message, "Sign in to continue");
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (ctx, _, _) = setup();
        let service = ReactionService::new(&ctx);

        for (project, kind) in [(Snowflake::new(0), "like"), (PROJECT, ""), (PROJECT, "meh")] {
            let err = service.toggle(&user(1), project, kind).await.unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Domain(DomainError::InvalidArgument(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let (ctx, _, _) = setup();
        let err = ReactionService::new(&ctx)
            .toggle(&user(1), Snowflake::new(999), "like")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_store_failure_sends_failure_notice() {
        let (ctx, store, sink) = setup();
        store.set_unavailable(true);

        let err = ReactionService::new(&ctx)
            .toggle(&user(1), PROJECT, "like")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);
        assert_eq!(sink.last().unwrap().level, NotificationLevel::Failure);
    }

    #[tokio::test]
    async fn test_summary_includes_viewer_reaction() {
        let (ctx, _, _) = setup();
        let service = ReactionService::new(&ctx);
        service.toggle(&user(1), PROJECT, "fire").await.unwrap();
        service.toggle(&user(2), PROJECT, "idea").await.unwrap();

        let mine = service.summary(PROJECT, &user(1)).await.unwrap();
        assert_eq!(mine.total, 2);
        assert_eq!(mine.viewer_reaction, Some(ReactionType::Fire));

        let anonymous = service
            .summary(PROJECT, &AuthContext::Anonymous)
            .await
            .unwrap();
        assert!(anonymous.viewer_reaction.is_none());
    }

    #[tokio::test]
    async fn test_reactors_are_decorated() {
        let (ctx, store, _) = setup();
        store.insert_profile(folio_core::Profile::new(Snowflake::new(1), "Ada", "a.png"));
        let service = ReactionService::new(&ctx);
        service.toggle(&user(1), PROJECT, "clap").await.unwrap();
        service.toggle(&user(2), PROJECT, "wow").await.unwrap();

        let all = service.reactors(PROJECT, None, 50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].user.name, "Ada");
        assert_eq!(all[1].user.name, folio_core::UNKNOWN_USER_NAME);

        let claps = service.reactors(PROJECT, Some("clap"), 50).await.unwrap();
        assert_eq!(claps.len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_requires_admin_and_repairs() {
        let (ctx, store, _) = setup();
        let service = ReactionService::new(&ctx);
        service.toggle(&user(1), PROJECT, "like").await.unwrap();

        let mut drifted = ReactionAggregate::empty(PROJECT);
        drifted.counts.insert(ReactionType::Like, 7);
        drifted.total = 7;
        store.overwrite_counters(drifted);

        let err = service.reconcile(&user(1), PROJECT).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::PermissionDenied(_))
        ));

        let moderator: AuthContext = Actor::new(Snowflake::new(8), Role::Moderator).into();
        assert!(service.reconcile(&moderator, PROJECT).await.is_err());

        let admin: AuthContext = Actor::new(Snowflake::new(9), Role::Admin).into();
        let repaired = service.reconcile(&admin, PROJECT).await.unwrap();
        assert_eq!(repaired.total, 1);
        assert_eq!(repaired.counts[&ReactionType::Like], 1);
    }
}
