//! # folio-cache
//!
//! Caching and messaging for the engagement engine.
//!
//! ## Features
//!
//! - **Profile cache**: TTL cache of author display data with batch lookups
//! - **Reply cache**: per-parent reply lists, invalidated on every tree change
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: change events across processes and per-user notifications
//!
//! ## Example
//!
//! ```ignore
//! use folio_cache::{ProfileCache, Publisher, RedisPool, RedisPoolConfig, PubSubEvent};
//!
//! let profiles = ProfileCache::new(store, Duration::from_secs(300));
//! let author = profiles.get(user_id).await;
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool);
//! publisher.publish_to_project(project_id, &PubSubEvent::new("CHANGE", data)).await?;
//! ```

pub mod local;
pub mod pool;
pub mod pubsub;

pub use local::{FillTicket, ProfileCache, ReplyCache};

pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

pub use pubsub::{
    PubSubChannel, PubSubEvent, Publisher, ReceivedMessage, Subscriber, SubscriberBuilder,
    SubscriberConfig, SubscriberError, SubscriberResult, Topic, ALL_PROJECTS_PATTERN,
    PROJECT_CHANNEL_PREFIX, USER_CHANNEL_PREFIX,
};
