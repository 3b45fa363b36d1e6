//! PostgreSQL implementation of CommentRepository

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use folio_core::{
    Comment, CommentDeletion, CommentPage, CommentRepository, DomainError, OrphanPolicy,
    RepoResult, Snowflake, TOMBSTONE_CONTENT,
};

use crate::models::CommentModel;

use super::error::{map_db_error, map_foreign_key_violation};

const COMMENT_COLUMNS: &str = "id, project_id, user_id, content, parent_comment_id, depth, \
     created_at, updated_at, replies_count, deleted";

/// PostgreSQL implementation of CommentRepository
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    /// Create a new PgCommentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn delete_row(tx: &mut Transaction<'_, Postgres>, id: Snowflake) -> RepoResult<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.into_inner())
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    /// Walk up from the parent of a removed comment: decrement its reply
    /// count and prune it if it is a tombstone left without children.
    async fn release_parent(
        tx: &mut Transaction<'_, Postgres>,
        mut parent_id: Option<Snowflake>,
        deletion: &mut CommentDeletion,
    ) -> RepoResult<()> {
        while let Some(id) = parent_id {
            let parent = sqlx::query_as::<_, CommentModel>(&format!(
                "UPDATE comments SET replies_count = GREATEST(replies_count - 1, 0) \
                 WHERE id = $1 \
                 RETURNING {COMMENT_COLUMNS}"
            ))
            .bind(id.into_inner())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?;

            let Some(parent) = parent.map(Comment::from) else {
                break;
            };

            if parent.is_tombstone() && !parent.has_replies() {
                Self::delete_row(tx, parent.id).await?;
                parent_id = parent.parent_comment_id;
                deletion.removed.push(parent);
            } else {
                deletion.updated_parents.push(parent);
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Comment>> {
        let result = sqlx::query_as::<_, CommentModel>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Comment::from))
    }

    #[instrument(skip(self))]
    async fn find_top_level(
        &self,
        project_id: Snowflake,
        page: CommentPage,
    ) -> RepoResult<Vec<Comment>> {
        let results = sqlx::query_as::<_, CommentModel>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE project_id = $1 AND parent_comment_id IS NULL \
               AND ($2::bigint IS NULL OR id < $2) \
             ORDER BY id DESC \
             LIMIT $3"
        ))
        .bind(project_id.into_inner())
        .bind(page.before.map(Snowflake::into_inner))
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Comment::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_replies(&self, parent_id: Snowflake) -> RepoResult<Vec<Comment>> {
        let results = sqlx::query_as::<_, CommentModel>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE parent_comment_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(parent_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Comment::from).collect())
    }

    #[instrument(skip(self, comment), fields(comment_id = %comment.id))]
    async fn create(&self, comment: &Comment) -> RepoResult<Comment> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if let Some(parent_id) = comment.parent_comment_id {
            let bumped = sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE comments SET replies_count = replies_count + 1
                WHERE id = $1 AND project_id = $2
                RETURNING id
                "#,
            )
            .bind(parent_id.into_inner())
            .bind(comment.project_id.into_inner())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;

            if bumped.is_none() {
                return Err(DomainError::CommentNotFound(parent_id));
            }
        }

        let project_id = comment.project_id;
        let row = sqlx::query_as::<_, CommentModel>(&format!(
            "INSERT INTO comments \
                 (id, project_id, user_id, content, parent_comment_id, depth, created_at, \
                  updated_at, replies_count, deleted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, 0, FALSE) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.id.into_inner())
        .bind(project_id.into_inner())
        .bind(comment.user_id.into_inner())
        .bind(&comment.content)
        .bind(comment.parent_comment_id.map(Snowflake::into_inner))
        .bind(comment.depth)
        .bind(comment.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, || DomainError::ProjectNotFound(project_id)))?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(Comment::from(row))
    }

    #[instrument(skip(self, content))]
    async fn update_content(&self, id: Snowflake, content: &str) -> RepoResult<Comment> {
        sqlx::query_as::<_, CommentModel>(&format!(
            "UPDATE comments SET content = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .map(Comment::from)
        .ok_or(DomainError::CommentNotFound(id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake, policy: OrphanPolicy) -> RepoResult<CommentDeletion> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let target = sqlx::query_as::<_, CommentModel>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .map(Comment::from)
        .ok_or(DomainError::CommentNotFound(id))?;

        let mut deletion = CommentDeletion::default();

        if target.has_replies() && policy == OrphanPolicy::Tombstone {
            let row = sqlx::query_as::<_, CommentModel>(&format!(
                "UPDATE comments SET content = $2, deleted = TRUE, updated_at = now() \
                 WHERE id = $1 \
                 RETURNING {COMMENT_COLUMNS}"
            ))
            .bind(id.into_inner())
            .bind(TOMBSTONE_CONTENT)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

            deletion.tombstoned = Some(Comment::from(row));
            tx.commit().await.map_err(map_db_error)?;
            return Ok(deletion);
        }

        if target.has_replies() {
            // Children go with the FK's ON DELETE CASCADE; collect them first
            // so callers can drop their cached views.
            let subtree = sqlx::query_as::<_, CommentModel>(
                r#"
                WITH RECURSIVE subtree AS (
                    SELECT * FROM comments WHERE id = $1
                    UNION ALL
                    SELECT c.* FROM comments c
                    JOIN subtree s ON c.parent_comment_id = s.id
                )
                SELECT id, project_id, user_id, content, parent_comment_id, depth,
                       created_at, updated_at, replies_count, deleted
                FROM subtree
                "#,
            )
            .bind(id.into_inner())
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;

            deletion.removed = subtree.into_iter().map(Comment::from).collect();
        } else {
            deletion.removed.push(target.clone());
        }

        Self::delete_row(&mut tx, id).await?;
        Self::release_parent(&mut tx, target.parent_comment_id, &mut deletion).await?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(deletion)
    }
}
