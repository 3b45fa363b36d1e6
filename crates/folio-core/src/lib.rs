//! # folio-core
//!
//! Domain layer for project engagement: reactions, their counters, threaded
//! comments, and display profiles, plus the store and collaborator traits the
//! outer crates implement. No database or web framework dependencies.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Comment, CommentDeletion, CommentPage, OrphanPolicy, Profile, Reaction, ReactionAggregate,
    ReactionState, ReactionTransition, ReactionType, TransitionKind, TOMBSTONE_CONTENT,
    UNKNOWN_USER_NAME,
};
pub use error::DomainError;
pub use events::{ChangeKind, DomainEvent, EntityKind};
pub use traits::{
    CommentRepository, ContentValidator, Notification, NotificationLevel, NotificationSink,
    ProfileStore, ProjectRepository, ReactionLedger, RepoResult, ToggleOutcome, ToggleRequest,
    ValidationOutcome,
};
pub use value_objects::{
    can_moderate, Actor, AuthContext, Capabilities, Role, Snowflake, SnowflakeGenerator,
    SnowflakeParseError,
};
