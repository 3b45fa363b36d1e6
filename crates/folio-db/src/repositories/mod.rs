//! Repository implementations
//!
//! PostgreSQL implementations of the store traits defined in folio-core.

mod comment;
mod error;
mod profile;
mod project;
mod reaction;

pub use comment::PgCommentRepository;
pub use profile::PgProfileStore;
pub use project::PgProjectRepository;
pub use reaction::PgReactionLedger;
