use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use folio_core::{
    Comment, CommentDeletion, CommentPage, CommentRepository, DomainError, OrphanPolicy, Profile,
    ProfileStore, ProjectRepository, Reaction, ReactionAggregate, ReactionLedger, ReactionState,
    ReactionType, RepoResult, Snowflake, ToggleOutcome, ToggleRequest, TransitionKind,
};

#[derive(Debug, Default)]
struct State {
    /// Counters per known project
    projects: HashMap<Snowflake, ReactionAggregate>,
    /// Ledger keyed by (project, user)
    reactions: HashMap<(Snowflake, Snowflake), Reaction>,
    comments: HashMap<Snowflake, Comment>,
    profiles: HashMap<Snowflake, Profile>,
    /// Treat every non-zero project id as existing
    open_projects: bool,
    unavailable: bool,
}

impl State {
    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable {
            return Err(DomainError::StoreFailure("store unavailable".to_string()));
        }
        Ok(())
    }

    /// Counters of an existing project, registering it first in open mode
    fn project_mut(&mut self, project_id: Snowflake) -> RepoResult<&mut ReactionAggregate> {
        if self.open_projects && !project_id.is_zero() {
            return Ok(self
                .projects
                .entry(project_id)
                .or_insert_with(|| ReactionAggregate::empty(project_id)));
        }
        self.projects
            .get_mut(&project_id)
            .ok_or(DomainError::ProjectNotFound(project_id))
    }

    fn project_exists(&self, project_id: Snowflake) -> bool {
        (self.open_projects && !project_id.is_zero()) || self.projects.contains_key(&project_id)
    }
}

/// Mutex-guarded store implementing the ledger, comment, project, and
/// profile traits with the same semantics as the Postgres repositories
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Empty store; projects must be registered with [`insert_project`](Self::insert_project)
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that accepts any non-zero project id
    pub fn with_open_projects() -> Self {
        let store = Self::default();
        store.state.lock().open_projects = true;
        store
    }

    pub fn insert_project(&self, project_id: Snowflake) {
        self.state
            .lock()
            .projects
            .entry(project_id)
            .or_insert_with(|| ReactionAggregate::empty(project_id));
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.state.lock().profiles.insert(profile.user_id, profile);
    }

    /// Make every call fail with `StoreFailure` until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Replace a project's stored counters without touching the ledger
    pub fn overwrite_counters(&self, aggregate: ReactionAggregate) {
        self.state
            .lock()
            .projects
            .insert(aggregate.project_id, aggregate);
    }

    /// Number of stored comment rows, tombstones included
    pub fn comment_count(&self) -> usize {
        self.state.lock().comments.len()
    }
}

#[async_trait]
impl ReactionLedger for MemoryStore {
    async fn find(&self, project_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Reaction>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.reactions.get(&(project_id, user_id)).cloned())
    }

    async fn find_by_project(
        &self,
        project_id: Snowflake,
        reaction_type: Option<ReactionType>,
        limit: i64,
    ) -> RepoResult<Vec<Reaction>> {
        let state = self.state.lock();
        state.check_available()?;

        let mut rows: Vec<Reaction> = state
            .reactions
            .values()
            .filter(|r| r.project_id == project_id)
            .filter(|r| reaction_type.map_or(true, |t| r.reaction_type == t))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        rows.truncate(limit.clamp(1, 100) as usize);
        Ok(rows)
    }

    #[instrument(skip(self), fields(project_id = %request.project_id, user_id = %request.user_id))]
    async fn toggle(&self, request: ToggleRequest) -> RepoResult<ToggleOutcome> {
        let mut state = self.state.lock();
        state.check_available()?;

        let key = (request.project_id, request.user_id);
        let current = state.reactions.get(&key);
        let transition =
            ReactionState::from_reaction(current).toggle(request.reaction_type);

        // Validate the project before mutating anything.
        let mut aggregate = state.project_mut(request.project_id)?.clone();
        aggregate.apply(&transition);

        let reaction = match transition.kind() {
            TransitionKind::Added | TransitionKind::Replaced => {
                let reaction = Reaction::new(
                    request.reaction_id,
                    request.project_id,
                    request.user_id,
                    request.reaction_type,
                );
                state.reactions.insert(key, reaction.clone());
                Some(reaction)
            }
            TransitionKind::Removed => {
                state.reactions.remove(&key);
                None
            }
        };

        state.projects.insert(request.project_id, aggregate.clone());

        Ok(ToggleOutcome {
            transition,
            reaction,
            aggregate,
        })
    }

    async fn aggregate(&self, project_id: Snowflake) -> RepoResult<ReactionAggregate> {
        let mut state = self.state.lock();
        state.check_available()?;
        Ok(state.project_mut(project_id)?.clone())
    }

    async fn reconcile(&self, project_id: Snowflake) -> RepoResult<ReactionAggregate> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.project_mut(project_id)?;

        let recounted = ReactionAggregate::from_reactions(
            project_id,
            state.reactions.values().filter(|r| r.project_id == project_id),
        );
        state.projects.insert(project_id, recounted.clone());
        Ok(recounted)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Comment>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.comments.get(&id).cloned())
    }

    async fn find_top_level(
        &self,
        project_id: Snowflake,
        page: CommentPage,
    ) -> RepoResult<Vec<Comment>> {
        let state = self.state.lock();
        state.check_available()?;

        let mut rows: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.project_id == project_id && !c.is_reply())
            .filter(|c| page.before.map_or(true, |before| c.id < before))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(page.limit.max(0) as usize);
        Ok(rows)
    }

    async fn find_replies(&self, parent_id: Snowflake) -> RepoResult<Vec<Comment>> {
        let state = self.state.lock();
        state.check_available()?;

        let mut rows: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.parent_comment_id == Some(parent_id))
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));
        Ok(rows)
    }

    async fn create(&self, comment: &Comment) -> RepoResult<Comment> {
        let mut state = self.state.lock();
        state.check_available()?;

        if !state.project_exists(comment.project_id) {
            return Err(DomainError::ProjectNotFound(comment.project_id));
        }

        if let Some(parent_id) = comment.parent_comment_id {
            let parent = state
                .comments
                .get_mut(&parent_id)
                .filter(|p| p.project_id == comment.project_id)
                .ok_or(DomainError::CommentNotFound(parent_id))?;
            parent.replies_count += 1;
        }

        let mut stored = comment.clone();
        stored.updated_at = None;
        stored.replies_count = 0;
        stored.deleted = false;
        state.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_content(&self, id: Snowflake, content: &str) -> RepoResult<Comment> {
        let mut state = self.state.lock();
        state.check_available()?;

        let comment = state
            .comments
            .get_mut(&id)
            .ok_or(DomainError::CommentNotFound(id))?;
        comment.edit(content.to_string());
        Ok(comment.clone())
    }

    async fn delete(&self, id: Snowflake, policy: OrphanPolicy) -> RepoResult<CommentDeletion> {
        let mut state = self.state.lock();
        state.check_available()?;

        let target = state
            .comments
            .get(&id)
            .cloned()
            .ok_or(DomainError::CommentNotFound(id))?;

        let mut deletion = CommentDeletion::default();

        if target.has_replies() && policy == OrphanPolicy::Tombstone {
            let comment = state
                .comments
                .get_mut(&id)
                .ok_or(DomainError::CommentNotFound(id))?;
            comment.tombstone();
            deletion.tombstoned = Some(comment.clone());
            return Ok(deletion);
        }

        // Remove the target and, for cascade deletes, everything below it.
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(removed) = state.comments.remove(&next) {
                pending.extend(
                    state
                        .comments
                        .values()
                        .filter(|c| c.parent_comment_id == Some(next))
                        .map(|c| c.id),
                );
                deletion.removed.push(removed);
            }
        }

        let mut parent_id = target.parent_comment_id;
        while let Some(pid) = parent_id {
            let Some(parent) = state.comments.get_mut(&pid) else {
                break;
            };
            parent.replies_count = (parent.replies_count - 1).max(0);

            if parent.is_tombstone() && !parent.has_replies() {
                let pruned = parent.clone();
                state.comments.remove(&pid);
                parent_id = pruned.parent_comment_id;
                deletion.removed.push(pruned);
            } else {
                deletion.updated_parents.push(parent.clone());
                break;
            }
        }

        Ok(deletion)
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn exists(&self, project_id: Snowflake) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.project_exists(project_id))
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, user_id: Snowflake) -> RepoResult<Option<Profile>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn find_profiles(&self, user_ids: &[Snowflake]) -> RepoResult<Vec<Profile>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }
}
