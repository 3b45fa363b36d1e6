//! Business logic services
//!
//! Reactions and comments, the shared read paths, and the collaborators
//! (validation, notification) they report through.

pub mod comment;
pub mod context;
pub mod error;
pub mod notifier;
pub mod reaction;
pub mod reader;
pub mod validation;

// Re-export all services for convenience
pub use comment::CommentService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use notifier::{
    MemoryNotificationSink, PubSubNotificationSink, TracingNotificationSink,
    NOTIFICATION_EVENT_TYPE,
};
pub use reaction::ReactionService;
pub use reader::EngagementReader;
pub use validation::DefaultContentValidator;
