//! PostgreSQL implementation of ProfileStore

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use folio_core::{Profile, ProfileStore, RepoResult, Snowflake};

use crate::models::ProfileModel;

use super::error::map_db_error;

/// Reads display profiles from the users table
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[instrument(skip(self))]
    async fn find_profile(&self, user_id: Snowflake) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(
            "SELECT id, name, avatar FROM users WHERE id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self, user_ids), fields(count = user_ids.len()))]
    async fn find_profiles(&self, user_ids: &[Snowflake]) -> RepoResult<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = user_ids.iter().map(|id| id.into_inner()).collect();
        let results = sqlx::query_as::<_, ProfileModel>(
            "SELECT id, name, avatar FROM users WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Profile::from).collect())
    }
}
