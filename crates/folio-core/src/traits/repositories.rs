//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! (`folio-db`) provides Postgres and in-memory implementations.

use async_trait::async_trait;

use crate::entities::{
    Comment, CommentDeletion, CommentPage, OrphanPolicy, Profile, Reaction, ReactionAggregate,
    ReactionTransition, ReactionType,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Reaction Ledger
// ============================================================================

/// A single toggle request as it reaches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleRequest {
    /// Id for the ledger row if this toggle inserts or replaces one
    pub reaction_id: Snowflake,
    pub project_id: Snowflake,
    pub user_id: Snowflake,
    pub reaction_type: ReactionType,
}

/// What a committed toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub transition: ReactionTransition,
    /// The live row after the toggle, `None` when toggled off
    pub reaction: Option<Reaction>,
    /// Project counters after the toggle
    pub aggregate: ReactionAggregate,
}

/// Ledger of one-reaction-per-user-per-project rows plus the project counters
/// derived from it.
///
/// Implementations must apply the ledger change and the counter deltas of a
/// toggle as one atomic unit.
#[async_trait]
pub trait ReactionLedger: Send + Sync {
    /// Current reaction of a user on a project
    async fn find(&self, project_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Reaction>>;

    /// Reactions on a project, oldest first, optionally filtered by type
    async fn find_by_project(
        &self,
        project_id: Snowflake,
        reaction_type: Option<ReactionType>,
        limit: i64,
    ) -> RepoResult<Vec<Reaction>>;

    /// Run one step of the toggle state machine for `(project, user)`
    async fn toggle(&self, request: ToggleRequest) -> RepoResult<ToggleOutcome>;

    /// Stored counters for a project
    async fn aggregate(&self, project_id: Snowflake) -> RepoResult<ReactionAggregate>;

    /// Recount the project's counters from its ledger rows and store them
    async fn reconcile(&self, project_id: Snowflake) -> RepoResult<ReactionAggregate>;
}

// ============================================================================
// Comment Repository
// ============================================================================

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Find comment by ID (tombstones included)
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Comment>>;

    /// Top-level comments of a project, newest first
    async fn find_top_level(
        &self,
        project_id: Snowflake,
        page: CommentPage,
    ) -> RepoResult<Vec<Comment>>;

    /// Direct replies of a comment, oldest first
    async fn find_replies(&self, parent_id: Snowflake) -> RepoResult<Vec<Comment>>;

    /// Insert a comment; for replies the parent's `replies_count` is
    /// incremented in the same transaction. Returns the stored row.
    async fn create(&self, comment: &Comment) -> RepoResult<Comment>;

    /// Replace the body of a comment and stamp `updated_at`
    async fn update_content(&self, id: Snowflake, content: &str) -> RepoResult<Comment>;

    /// Delete a comment according to `policy`
    async fn delete(&self, id: Snowflake, policy: OrphanPolicy) -> RepoResult<CommentDeletion>;
}

// ============================================================================
// Project Repository
// ============================================================================

/// Read-only view of the projects this engine attaches engagement to
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn exists(&self, project_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Profile Store
// ============================================================================

/// Backing store for the profile cache
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user_id: Snowflake) -> RepoResult<Option<Profile>>;

    /// Batch lookup; ids without a profile are simply absent from the result
    async fn find_profiles(&self, user_ids: &[Snowflake]) -> RepoResult<Vec<Profile>>;
}
