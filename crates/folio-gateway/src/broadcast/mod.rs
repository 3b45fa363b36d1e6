//! Event broadcasting
//!
//! Carries events published by other processes over Redis Pub/Sub to the
//! WebSocket connections of this one.

mod dispatcher;
mod router;

pub use dispatcher::{EventDispatcher, EventDispatcherConfig};
pub use router::{EventRouter, Routed};
