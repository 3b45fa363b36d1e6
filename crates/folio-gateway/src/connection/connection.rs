//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection, its identity and the project
//! subscriptions it holds on the realtime bridge.

use crate::events::GatewayEventType;
use crate::protocol::GatewayMessage;
use folio_core::{Actor, AuthContext, Snowflake};
use folio_service::Subscription;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex, RwLock};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Hello sent; may watch projects anonymously
    Connected,
    /// Identified with an access token
    Identified,
    /// Connection is closed
    Disconnected,
}

/// Why a dispatch could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Outgoing buffer is full; the client is not keeping up
    Full,
    /// Writer task has ended
    Closed,
}

/// A single WebSocket connection
pub struct Connection {
    session_id: String,
    auth: RwLock<AuthContext>,
    state: RwLock<ConnectionState>,

    /// Channel to the writer task
    sender: mpsc::Sender<GatewayMessage>,

    /// Last dispatch sequence number sent
    sequence: AtomicU64,

    last_heartbeat: RwLock<Instant>,

    /// At most one bridge subscription per project
    subscriptions: Mutex<HashMap<Snowflake, Subscription>>,

    created_at: Instant,
}

impl Connection {
    pub fn new(session_id: String, sender: mpsc::Sender<GatewayMessage>) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            auth: RwLock::new(AuthContext::Anonymous),
            state: RwLock::new(ConnectionState::Connected),
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: RwLock::new(Instant::now()),
            subscriptions: Mutex::new(HashMap::new()),
            created_at: Instant::now(),
        })
    }

    /// Fresh random session id
    #[must_use]
    pub fn generate_session_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn auth(&self) -> AuthContext {
        *self.auth.read().await
    }

    pub async fn user_id(&self) -> Option<Snowflake> {
        self.auth.read().await.user_id()
    }

    pub async fn is_identified(&self) -> bool {
        self.auth.read().await.actor().is_some()
    }

    /// Attach a verified identity
    pub async fn identify(&self, actor: Actor) {
        *self.auth.write().await = AuthContext::from(actor);
        *self.state.write().await = ConnectionState::Identified;
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub async fn record_heartbeat(&self) {
        *self.last_heartbeat.write().await = Instant::now();
    }

    pub async fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.read().await.elapsed()
    }

    /// Queue a message, waiting for buffer space
    pub async fn send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::SendError<GatewayMessage>> {
        self.sender.send(message).await
    }

    /// Queue a dispatch event, waiting for buffer space
    pub async fn dispatch(&self, event: GatewayEventType, data: Value) -> Result<(), DispatchError> {
        let message = GatewayMessage::dispatch(event.as_str(), self.next_sequence(), data);
        self.sender
            .send(message)
            .await
            .map_err(|_| DispatchError::Closed)
    }

    /// Queue a dispatch event without waiting
    pub fn try_dispatch(&self, event: GatewayEventType, data: Value) -> Result<(), DispatchError> {
        let message = GatewayMessage::dispatch(event.as_str(), self.next_sequence(), data);
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::Full,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }

    /// Keep `subscription` unless the project is already watched
    ///
    /// Returns `false` when a subscription for the project existed; the new
    /// one is dropped in that case.
    pub async fn add_subscription(&self, subscription: Subscription) -> bool {
        let mut subscriptions = self.subscriptions.lock().await;
        let project_id = subscription.project_id();
        if subscriptions.contains_key(&project_id) {
            return false;
        }
        subscriptions.insert(project_id, subscription);
        true
    }

    pub async fn remove_subscription(&self, project_id: Snowflake) -> bool {
        self.subscriptions
            .lock()
            .await
            .remove(&project_id)
            .map(Subscription::unsubscribe)
            .is_some()
    }

    pub async fn is_subscribed_to(&self, project_id: Snowflake) -> bool {
        self.subscriptions.lock().await.contains_key(&project_id)
    }

    /// Watched projects, in id order
    pub async fn subscriptions(&self) -> Vec<Snowflake> {
        let mut ids: Vec<_> = self.subscriptions.lock().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    /// Drop every subscription; returns how many there were
    pub async fn clear_subscriptions(&self) -> usize {
        let mut subscriptions = self.subscriptions.lock().await;
        let count = subscriptions.len();
        subscriptions.clear();
        count
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Role;

    #[tokio::test]
    async fn test_connection_starts_anonymous() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new("session123".to_string(), tx);

        assert_eq!(conn.session_id(), "session123");
        assert!(conn.user_id().await.is_none());
        assert!(!conn.is_identified().await);
        assert_eq!(conn.state().await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_identify() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new("session123".to_string(), tx);

        conn.identify(Actor::new(Snowflake::new(5), Role::Moderator)).await;

        assert!(conn.is_identified().await);
        assert_eq!(conn.user_id().await, Some(Snowflake::new(5)));
        assert_eq!(conn.state().await, ConnectionState::Identified);
    }

    #[tokio::test]
    async fn test_dispatch_stamps_sequence() {
        let (tx, mut rx) = mpsc::channel(10);
        let conn = Connection::new("s".to_string(), tx);

        conn.dispatch(GatewayEventType::Ready, serde_json::json!({}))
            .await
            .unwrap();
        conn.try_dispatch(GatewayEventType::Change, serde_json::json!({}))
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().s, Some(1));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.s, Some(2));
        assert_eq!(second.t.as_deref(), Some("CHANGE"));
        assert_eq!(conn.current_sequence(), 2);
    }

    #[tokio::test]
    async fn test_try_dispatch_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let conn = Connection::new("s".to_string(), tx);

        conn.try_dispatch(GatewayEventType::Change, Value::Null).unwrap();
        assert_eq!(
            conn.try_dispatch(GatewayEventType::Change, Value::Null),
            Err(DispatchError::Full)
        );

        drop(rx);
        assert!(conn.is_closed());
        assert_eq!(
            conn.try_dispatch(GatewayEventType::Change, Value::Null),
            Err(DispatchError::Closed)
        );
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(
            Connection::generate_session_id(),
            Connection::generate_session_id()
        );
    }
}
