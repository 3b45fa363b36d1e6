//! Redis Pub/Sub module.
//!
//! Carries realtime change events between processes and per-user notifications.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{
    PubSubChannel, ALL_PROJECTS_PATTERN, PROJECT_CHANNEL_PREFIX, USER_CHANNEL_PREFIX,
};
pub use publisher::{PubSubEvent, Publisher};
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult, Topic,
};
