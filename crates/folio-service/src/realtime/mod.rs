//! Realtime subscription bridge
//!
//! - `bridge`: per-project broadcast bus with view recomputation
//! - `events`: the change events and views subscribers receive
//! - `relay`: forwarding to other processes over Redis
//! - `view_state`: reference idempotent subscriber model

mod bridge;
mod events;
mod relay;
mod view_state;

pub use bridge::{ChangeHandler, RealtimeBridge, Subscription, DEFAULT_BUFFER};
pub use events::{ChangeEvent, ReactionChangeView, ThreadView, ViewPayload, CHANGE_EVENT_TYPE};
pub use relay::{EventRelay, RedisEventRelay};
pub use view_state::ProjectViewState;
