//! Connection manager
//!
//! Manages all active WebSocket connections using DashMap for thread-safe access.
//! Project fan-out lives on the realtime bridge; this only tracks sessions and
//! the users behind them.

use super::{Connection, ConnectionState};
use crate::events::GatewayEventType;
use crate::protocol::GatewayMessage;
use dashmap::DashMap;
use folio_core::{Actor, Snowflake};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,

    /// User ID to session IDs mapping
    user_connections: DashMap<Snowflake, HashSet<String>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        session_id: String,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), sender);
        self.connections.insert(session_id.clone(), connection.clone());

        tracing::debug!(session_id = %session_id, "Connection added");

        connection
    }

    /// Remove a connection and end its project subscriptions
    pub async fn remove_connection(&self, session_id: &str) {
        if let Some((_, connection)) = self.connections.remove(session_id) {
            connection.set_state(ConnectionState::Disconnected).await;
            let subscriptions = connection.clear_subscriptions().await;

            if let Some(user_id) = connection.user_id().await {
                self.user_connections.alter(&user_id, |_, mut sessions| {
                    sessions.remove(session_id);
                    sessions
                });
                self.user_connections
                    .remove_if(&user_id, |_, sessions| sessions.is_empty());
            }

            tracing::debug!(session_id = %session_id, subscriptions, "Connection removed");
        }
    }

    pub fn get_connection(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(session_id).map(|r| r.clone())
    }

    /// Link a connection to a verified user
    pub async fn identify_connection(&self, session_id: &str, actor: Actor) -> bool {
        let Some(connection) = self.get_connection(session_id) else {
            return false;
        };

        connection.identify(actor).await;
        self.user_connections
            .entry(actor.user_id)
            .or_default()
            .insert(session_id.to_string());

        tracing::debug!(
            session_id = %session_id,
            user_id = %actor.user_id,
            "Connection identified"
        );
        true
    }

    pub fn get_user_connections(&self, user_id: Snowflake) -> Vec<Arc<Connection>> {
        self.user_connections
            .get(&user_id)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dispatch an event to every connection of a user
    pub async fn send_to_user(
        &self,
        user_id: Snowflake,
        event: GatewayEventType,
        data: Value,
    ) -> usize {
        let mut sent = 0;
        for conn in self.get_user_connections(user_id) {
            if conn.dispatch(event, data.clone()).await.is_ok() {
                sent += 1;
            }
        }

        tracing::trace!(user_id = %user_id, event = %event, sent, "Event sent to user connections");
        sent
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of distinct identified users
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    /// Remove connections whose writer has gone away
    pub async fn cleanup_closed_connections(&self) -> usize {
        let closed: Vec<String> = self
            .connections
            .iter()
            .filter(|r| r.is_closed())
            .map(|r| r.key().clone())
            .collect();

        let count = closed.len();
        for session_id in closed {
            self.remove_connection(&session_id).await;
        }

        if count > 0 {
            tracing::info!(count, "Cleaned up closed connections");
        }
        count
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .finish()
    }
}
