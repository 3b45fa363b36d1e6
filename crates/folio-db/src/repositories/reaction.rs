//! PostgreSQL implementation of ReactionLedger
//!
//! A toggle runs in one transaction under the project row lock: the user's
//! ledger row is read, the transition is computed from it, the row is
//! inserted, retyped, or deleted, and each counter delta is applied to the
//! project row with a JSONB increment. Readers never observe the ledger and
//! the counters disagree.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use folio_core::{
    DomainError, Reaction, ReactionAggregate, ReactionLedger, ReactionState, ReactionType,
    RepoResult, Snowflake, ToggleOutcome, ToggleRequest, TransitionKind,
};

use crate::mappers::counters_to_aggregate;
use crate::models::{ProjectCountersModel, ReactionModel, ReactionTypeCountModel};

use super::error::map_db_error;

const REACTION_COLUMNS: &str = "id, project_id, user_id, reaction_type, created_at";

/// PostgreSQL implementation of ReactionLedger
#[derive(Clone)]
pub struct PgReactionLedger {
    pool: PgPool,
}

impl PgReactionLedger {
    /// Create a new PgReactionLedger
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the project row for the rest of the transaction
    ///
    /// Every toggle and recount on a project takes this lock first, so they
    /// run one at a time per project and the ledger read below cannot race.
    async fn lock_project(
        tx: &mut Transaction<'_, Postgres>,
        project_id: Snowflake,
    ) -> RepoResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(project_id.into_inner())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?
            .map(|_| ())
            .ok_or(DomainError::ProjectNotFound(project_id))
    }

    async fn find_current(
        tx: &mut Transaction<'_, Postgres>,
        project_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Reaction>> {
        let row = sqlx::query_as::<_, ReactionModel>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE project_id = $1 AND user_id = $2"
        ))
        .bind(project_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_error)?;

        row.map(Reaction::try_from).transpose()
    }

    /// Apply one per-type delta (and the total delta) to the project row
    async fn bump_counter(
        tx: &mut Transaction<'_, Postgres>,
        project_id: Snowflake,
        reaction_type: ReactionType,
        delta: i64,
        total_delta: i64,
    ) -> RepoResult<ProjectCountersModel> {
        sqlx::query_as::<_, ProjectCountersModel>(
            r#"
            UPDATE projects
            SET reactions_count = jsonb_set(
                    reactions_count,
                    ARRAY[$2::text],
                    to_jsonb(GREATEST(COALESCE((reactions_count->>$2::text)::bigint, 0) + $3, 0)),
                    true
                ),
                total_reactions = GREATEST(total_reactions + $4, 0)
            WHERE id = $1
            RETURNING id, reactions_count, total_reactions
            "#,
        )
        .bind(project_id.into_inner())
        .bind(reaction_type.as_str())
        .bind(delta)
        .bind(total_delta)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_error)?
        .ok_or(DomainError::ProjectNotFound(project_id))
    }
}

#[async_trait]
impl ReactionLedger for PgReactionLedger {
    #[instrument(skip(self))]
    async fn find(&self, project_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Reaction>> {
        let result = sqlx::query_as::<_, ReactionModel>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE project_id = $1 AND user_id = $2"
        ))
        .bind(project_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Reaction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_project(
        &self,
        project_id: Snowflake,
        reaction_type: Option<ReactionType>,
        limit: i64,
    ) -> RepoResult<Vec<Reaction>> {
        let limit = limit.clamp(1, 100);

        let results = sqlx::query_as::<_, ReactionModel>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions \
             WHERE project_id = $1 AND ($2::text IS NULL OR reaction_type = $2) \
             ORDER BY created_at, id \
             LIMIT $3"
        ))
        .bind(project_id.into_inner())
        .bind(reaction_type.map(ReactionType::as_str))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Reaction::try_from).collect()
    }

    #[instrument(skip(self), fields(project_id = %request.project_id, user_id = %request.user_id))]
    async fn toggle(&self, request: ToggleRequest) -> RepoResult<ToggleOutcome> {
        let ToggleRequest {
            reaction_id,
            project_id,
            user_id,
            reaction_type,
        } = request;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        Self::lock_project(&mut tx, project_id).await?;

        let current = Self::find_current(&mut tx, project_id, user_id).await?;
        let transition = ReactionState::from_reaction(current.as_ref()).toggle(reaction_type);

        let reaction = match (transition.kind(), current) {
            (TransitionKind::Added, _) => {
                let row = sqlx::query_as::<_, ReactionModel>(&format!(
                    "INSERT INTO reactions (id, project_id, user_id, reaction_type) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING {REACTION_COLUMNS}"
                ))
                .bind(reaction_id.into_inner())
                .bind(project_id.into_inner())
                .bind(user_id.into_inner())
                .bind(reaction_type.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(map_db_error)?;

                Some(Reaction::try_from(row)?)
            }
            (TransitionKind::Replaced, Some(existing)) => {
                let row = sqlx::query_as::<_, ReactionModel>(&format!(
                    "UPDATE reactions SET id = $2, reaction_type = $3, created_at = now() \
                     WHERE id = $1 \
                     RETURNING {REACTION_COLUMNS}"
                ))
                .bind(existing.id.into_inner())
                .bind(reaction_id.into_inner())
                .bind(reaction_type.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(map_db_error)?;

                Some(Reaction::try_from(row)?)
            }
            (TransitionKind::Removed, Some(existing)) => {
                sqlx::query("DELETE FROM reactions WHERE id = $1")
                    .bind(existing.id.into_inner())
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_error)?;

                None
            }
            (_, None) => {
                return Err(DomainError::InternalError(
                    "toggle transition without a current row".to_string(),
                ))
            }
        };
        debug!(kind = ?transition.kind(), "Reaction toggled");

        let mut counters = None;
        let mut total_delta = transition.total_delta();
        for (t, delta) in transition.counter_deltas() {
            counters = Some(Self::bump_counter(&mut tx, project_id, t, delta, total_delta).await?);
            total_delta = 0;
        }
        let counters = counters.ok_or_else(|| {
            DomainError::InternalError("toggle produced no counter deltas".to_string())
        })?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(ToggleOutcome {
            transition,
            reaction,
            aggregate: counters_to_aggregate(counters),
        })
    }

    #[instrument(skip(self))]
    async fn aggregate(&self, project_id: Snowflake) -> RepoResult<ReactionAggregate> {
        sqlx::query_as::<_, ProjectCountersModel>(
            r#"
            SELECT id, reactions_count, total_reactions
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .map(counters_to_aggregate)
        .ok_or(DomainError::ProjectNotFound(project_id))
    }

    #[instrument(skip(self))]
    async fn reconcile(&self, project_id: Snowflake) -> RepoResult<ReactionAggregate> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        Self::lock_project(&mut tx, project_id).await?;

        let rows = sqlx::query_as::<_, ReactionTypeCountModel>(
            r#"
            SELECT reaction_type, COUNT(*) AS count
            FROM reactions
            WHERE project_id = $1
            GROUP BY reaction_type
            "#,
        )
        .bind(project_id.into_inner())
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let t = row.reaction_type.parse::<ReactionType>().map_err(|_| {
                DomainError::StoreFailure(format!("unknown reaction type {:?}", row.reaction_type))
            })?;
            counts.push((t, row.count));
        }
        let total = counts.iter().map(|(_, n)| n).sum();
        let recounted = ReactionAggregate::from_counts(project_id, counts, total);

        let json: serde_json::Map<String, serde_json::Value> = recounted
            .counts
            .iter()
            .map(|(t, n)| (t.as_str().to_string(), serde_json::Value::from(*n)))
            .collect();

        sqlx::query(
            r#"
            UPDATE projects
            SET reactions_count = $2, total_reactions = $3
            WHERE id = $1
            "#,
        )
        .bind(project_id.into_inner())
        .bind(sqlx::types::Json(json))
        .bind(recounted.total)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(recounted)
    }
}
