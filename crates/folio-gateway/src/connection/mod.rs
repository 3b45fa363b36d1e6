//! Connection management
//!
//! Tracks live WebSocket connections and who they belong to.

mod connection;
mod manager;

pub use connection::{Connection, ConnectionState, DispatchError};
pub use manager::ConnectionManager;
