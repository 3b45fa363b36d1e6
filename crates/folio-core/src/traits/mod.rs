//! Ports implemented by the infrastructure crates

mod collaborators;
mod repositories;

pub use collaborators::{
    ContentValidator, Notification, NotificationLevel, NotificationSink, ValidationOutcome,
};
pub use repositories::{
    CommentRepository, ProfileStore, ProjectRepository, ReactionLedger, RepoResult,
    ToggleOutcome, ToggleRequest,
};
