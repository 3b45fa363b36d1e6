//! Database connection pool management

mod postgres;

pub use postgres::{connect, create_pool, ping, run_migrations, PoolOptions};

// Re-export PgPool for convenience
pub use sqlx::postgres::PgPool;
