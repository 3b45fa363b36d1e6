//! Read-only user profile model

use sqlx::FromRow;

/// Display columns of the users table
#[derive(Debug, Clone, FromRow)]
pub struct ProfileModel {
    pub id: i64,
    pub name: String,
    pub avatar: String,
}
