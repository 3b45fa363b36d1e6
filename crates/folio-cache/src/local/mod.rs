//! In-process caches
//!
//! Both caches are explicit objects with a TTL, shared behind `Arc` by the
//! service layer. Entries are stamped with `tokio::time::Instant` so tests can
//! drive expiry with a paused clock.

mod profile_cache;
mod reply_cache;

pub use profile_cache::ProfileCache;
pub use reply_cache::{FillTicket, ReplyCache};
