//! Event dispatcher
//!
//! Listens on Redis Pub/Sub for events published by API processes and hands
//! them to the [`EventRouter`].

use super::router::EventRouter;
use folio_cache::{Subscriber, SubscriberBuilder, ALL_PROJECTS_PATTERN, USER_CHANNEL_PREFIX};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Configuration for the event dispatcher
#[derive(Debug, Clone)]
pub struct EventDispatcherConfig {
    pub redis_url: String,
    /// Broadcast buffer size
    pub broadcast_buffer: usize,
    pub reconnect_delay_ms: u64,
}

impl Default for EventDispatcherConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Routes Redis Pub/Sub messages to local subscribers
pub struct EventDispatcher {
    router: EventRouter,
    subscriber: Subscriber,
    running: Arc<AtomicBool>,
}

impl EventDispatcher {
    /// Listen on every project channel and every user channel
    pub async fn new(
        config: EventDispatcherConfig,
        router: EventRouter,
    ) -> Result<Self, folio_cache::SubscriberError> {
        let subscriber = SubscriberBuilder::new()
            .redis_url(&config.redis_url)
            .broadcast_buffer(config.broadcast_buffer)
            .reconnect_delay_ms(config.reconnect_delay_ms)
            .psubscribe(ALL_PROJECTS_PATTERN)
            .psubscribe(format!("{USER_CHANNEL_PREFIX}*"))
            .build()
            .await?;

        Ok(Self {
            router,
            subscriber,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Spawn the receive loop
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run().await;
        });

        tracing::info!("Event dispatcher started");
    }

    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.subscriber.shutdown().await.ok();
        tracing::info!("Event dispatcher stopped");
    }

    async fn run(&self) {
        let mut receiver = self.subscriber.receiver();

        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    self.router.route(&msg).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Event dispatcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event dispatcher channel closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher loop ended");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
