//! Reaction ledger and project counter models

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Database model for reactions table
#[derive(Debug, Clone, FromRow)]
pub struct ReactionModel {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
}

/// Counter columns of the projects table
#[derive(Debug, Clone, FromRow)]
pub struct ProjectCountersModel {
    pub id: i64,
    pub reactions_count: Json<BTreeMap<String, i64>>,
    pub total_reactions: i64,
}

/// Per-type ledger count (from GROUP BY)
#[derive(Debug, Clone, FromRow)]
pub struct ReactionTypeCountModel {
    pub reaction_type: String,
    pub count: i64,
}
