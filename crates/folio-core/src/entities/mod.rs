//! Domain entities - core business objects

mod aggregate;
mod comment;
mod profile;
mod reaction;

pub use aggregate::ReactionAggregate;
pub use comment::{Comment, CommentDeletion, CommentPage, OrphanPolicy, TOMBSTONE_CONTENT};
pub use profile::{Profile, UNKNOWN_USER_NAME};
pub use reaction::{Reaction, ReactionState, ReactionTransition, ReactionType, TransitionKind};
