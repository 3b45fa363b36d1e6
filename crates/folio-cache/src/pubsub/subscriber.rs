//! Redis Pub/Sub subscriber.
//!
//! Owns a dedicated pub/sub connection in a background task, re-subscribes
//! after reconnecting, and fans received messages out over a broadcast channel.

use crate::pubsub::{PubSubChannel, PubSubEvent};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Channel closed")]
    ChannelClosed,
}

pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// What a subscription listens to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Channel(String),
    /// Glob pattern, e.g. `project:*`
    Pattern(String),
}

/// Message received from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Channel the message was published on, if it is one of ours
    pub channel: Option<PubSubChannel>,
    /// Parsed envelope (if valid JSON)
    pub event: Option<PubSubEvent>,
    pub payload: String,
}

impl ReceivedMessage {
    fn from_redis(channel_name: &str, payload: String) -> Self {
        Self {
            channel: PubSubChannel::parse(channel_name),
            event: serde_json::from_str(&payload).ok(),
            payload,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub redis_url: String,
    /// Broadcast buffer before slow receivers start lagging
    pub broadcast_buffer: usize,
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

#[derive(Debug)]
enum Command {
    Subscribe(Vec<Topic>),
    Unsubscribe(Vec<Topic>),
    Shutdown,
}

/// Redis Pub/Sub subscriber
pub struct Subscriber {
    topics: Arc<RwLock<HashSet<Topic>>>,
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    control_tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("receivers", &self.broadcast_tx.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Subscriber {
    /// Create a subscriber and start the background listener
    #[must_use]
    pub fn start(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);
        let topics = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(listener_loop(
            config,
            topics.clone(),
            broadcast_tx.clone(),
            control_rx,
        ));

        Self {
            topics,
            broadcast_tx,
            control_tx,
        }
    }

    pub async fn subscribe(&self, channels: &[PubSubChannel]) -> SubscriberResult<()> {
        let topics = channels.iter().map(|c| Topic::Channel(c.name())).collect();
        self.send(Command::Subscribe(topics)).await
    }

    pub async fn unsubscribe(&self, channels: &[PubSubChannel]) -> SubscriberResult<()> {
        let topics = channels.iter().map(|c| Topic::Channel(c.name())).collect();
        self.send(Command::Unsubscribe(topics)).await
    }

    /// Subscribe to every channel matching a glob pattern
    pub async fn psubscribe(&self, pattern: &str) -> SubscriberResult<()> {
        self.send(Command::Subscribe(vec![Topic::Pattern(pattern.to_string())]))
            .await
    }

    /// Get a receiver for everything this subscriber hears
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    pub async fn topics(&self) -> Vec<Topic> {
        self.topics.read().await.iter().cloned().collect()
    }

    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> SubscriberResult<()> {
        self.control_tx
            .send(command)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

async fn listener_loop(
    config: SubscriberConfig,
    topics: Arc<RwLock<HashSet<Topic>>>,
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    mut control_rx: mpsc::Receiver<Command>,
) {
    loop {
        match run_listener(&config, &topics, &broadcast_tx, &mut control_rx).await {
            Ok(()) => {
                tracing::info!("Subscriber shutting down");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "Subscriber error, reconnecting...");
                tokio::time::sleep(tokio::time::Duration::from_millis(config.reconnect_delay_ms))
                    .await;
            }
        }
    }
}

async fn apply(pubsub: &mut redis::aio::PubSub, topic: &Topic, on: bool) -> redis::RedisResult<()> {
    match (topic, on) {
        (Topic::Channel(name), true) => pubsub.subscribe(name).await,
        (Topic::Channel(name), false) => pubsub.unsubscribe(name).await,
        (Topic::Pattern(pattern), true) => pubsub.psubscribe(pattern).await,
        (Topic::Pattern(pattern), false) => pubsub.punsubscribe(pattern).await,
    }
}

/// Run until shutdown (`Ok`) or a connection error (`Err`)
async fn run_listener(
    config: &SubscriberConfig,
    topics: &Arc<RwLock<HashSet<Topic>>>,
    broadcast_tx: &broadcast::Sender<ReceivedMessage>,
    control_rx: &mut mpsc::Receiver<Command>,
) -> SubscriberResult<()> {
    let client = Client::open(config.redis_url.as_str())?;
    let mut pubsub = client.get_async_pubsub().await?;

    for topic in topics.read().await.iter() {
        apply(&mut pubsub, topic, true).await?;
    }

    tracing::info!("Subscriber connected to Redis");

    loop {
        let command = {
            let mut stream = pubsub.on_message();
            loop {
                tokio::select! {
                    msg = stream.next() => {
                        let Some(msg) = msg else {
                            return Err(SubscriberError::Redis(redis::RedisError::from((
                                redis::ErrorKind::IoError,
                                "pub/sub stream ended",
                            ))));
                        };
                        let payload: String = msg.get_payload().unwrap_or_default();
                        let received = ReceivedMessage::from_redis(msg.get_channel_name(), payload);
                        // No receivers is fine
                        let _ = broadcast_tx.send(received);
                    }
                    cmd = control_rx.recv() => break cmd,
                }
            }
        };

        match command {
            Some(Command::Subscribe(new_topics)) => {
                for topic in new_topics {
                    if let Err(e) = apply(&mut pubsub, &topic, true).await {
                        tracing::error!(topic = ?topic, error = %e, "Failed to subscribe");
                    } else {
                        tracing::debug!(topic = ?topic, "Subscribed");
                        topics.write().await.insert(topic);
                    }
                }
            }
            Some(Command::Unsubscribe(old_topics)) => {
                for topic in old_topics {
                    if let Err(e) = apply(&mut pubsub, &topic, false).await {
                        tracing::error!(topic = ?topic, error = %e, "Failed to unsubscribe");
                    } else {
                        tracing::debug!(topic = ?topic, "Unsubscribed");
                        topics.write().await.remove(&topic);
                    }
                }
            }
            Some(Command::Shutdown) | None => return Ok(()),
        }
    }
}

/// Builder for subscriber
#[derive(Debug, Default)]
pub struct SubscriberBuilder {
    config: SubscriberConfig,
    initial: Vec<Topic>,
}

impl SubscriberBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    #[must_use]
    pub fn subscribe(mut self, channel: PubSubChannel) -> Self {
        self.initial.push(Topic::Channel(channel.name()));
        self
    }

    #[must_use]
    pub fn psubscribe(mut self, pattern: impl Into<String>) -> Self {
        self.initial.push(Topic::Pattern(pattern.into()));
        self
    }

    /// Build and start the subscriber
    pub async fn build(self) -> SubscriberResult<Subscriber> {
        let subscriber = Subscriber::start(self.config);
        if !self.initial.is_empty() {
            subscriber.send(Command::Subscribe(self.initial)).await?;
        }
        Ok(subscriber)
    }
}
