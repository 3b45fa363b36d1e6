//! Domain events

mod domain_event;

pub use domain_event::{
    ChangeKind, CommentChangedEvent, CommentRemovedEvent, CountersReconciledEvent, DomainEvent,
    EntityKind, ReactionChangedEvent,
};
