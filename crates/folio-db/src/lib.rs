//! # folio-db
//!
//! Storage layer for the engagement engine.
//!
//! ## Overview
//!
//! Implements the store traits defined in `folio-core` twice:
//!
//! - PostgreSQL repositories via SQLx (`repositories`), with the schema in
//!   `migrations/`
//! - An in-process [`MemoryStore`] for local runs and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_common::AppConfig;
//! use folio_db::{connect, PgReactionLedger};
//!
//! async fn example(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     if let Some(db) = &config.database {
//!         let pool = connect(db).await?;
//!         let ledger = PgReactionLedger::new(pool);
//!         // Use the ledger...
//!     }
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{connect, create_pool, ping, run_migrations, PgPool, PoolOptions};
pub use repositories::{
    PgCommentRepository, PgProfileStore, PgProjectRepository, PgReactionLedger,
};
