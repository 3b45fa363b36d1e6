//! Per-project change bus
//!
//! Mutating services publish [`DomainEvent`]s here after their store call
//! commits. The bridge recomputes the affected view, stamps a sequence number,
//! and fans the resulting [`ChangeEvent`] out to every subscriber of the
//! project over a tokio broadcast channel, then hands it to the relay.

use dashmap::DashMap;
use folio_core::{CommentPage, DomainEvent, Snowflake};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::events::{ChangeEvent, ReactionChangeView, ThreadView, ViewPayload};
use super::relay::EventRelay;
use crate::dto::AuthorView;
use crate::services::{EngagementReader, ServiceError, ServiceResult};

/// Default per-project buffer before slow subscribers start lagging
pub const DEFAULT_BUFFER: usize = 256;

/// Receives the change events of one project
pub trait ChangeHandler: Send + Sync + 'static {
    fn handle(&self, event: &ChangeEvent);
}

impl<F> ChangeHandler for F
where
    F: Fn(&ChangeEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: &ChangeEvent) {
        self(event)
    }
}

struct BridgeInner {
    reader: EngagementReader,
    relay: Option<Arc<dyn EventRelay>>,
    channels: DashMap<Snowflake, broadcast::Sender<Arc<ChangeEvent>>>,
    /// Serializes render-and-deliver per project so subscribers never see an
    /// older view after a newer one
    publish_locks: DashMap<Snowflake, Arc<Mutex<()>>>,
    seq: AtomicU64,
    buffer: usize,
}

/// Typed per-project event bus; cheap to clone
#[derive(Clone)]
pub struct RealtimeBridge {
    inner: Arc<BridgeInner>,
}

impl std::fmt::Debug for RealtimeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeBridge")
            .field("projects", &self.inner.channels.len())
            .field("seq", &self.inner.seq.load(Ordering::Relaxed))
            .field("relay", &self.inner.relay.is_some())
            .finish()
    }
}

impl RealtimeBridge {
    pub fn new(reader: EngagementReader, buffer: usize) -> Self {
        Self::build(reader, buffer, None)
    }

    pub fn with_relay(reader: EngagementReader, buffer: usize, relay: Arc<dyn EventRelay>) -> Self {
        Self::build(reader, buffer, Some(relay))
    }

    fn build(reader: EngagementReader, buffer: usize, relay: Option<Arc<dyn EventRelay>>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                reader,
                relay,
                channels: DashMap::new(),
                publish_locks: DashMap::new(),
                seq: AtomicU64::new(0),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Deliver every future change of `project_id` to `handler` until the
    /// returned [`Subscription`] is dropped
    pub fn subscribe<H: ChangeHandler>(&self, project_id: Snowflake, handler: H) -> Subscription {
        let mut receiver = self.receiver(project_id);

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => handler.handle(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(project_id = %project_id, skipped, "Subscriber lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        debug!(project_id = %project_id, "Realtime subscription opened");
        Subscription { project_id, task }
    }

    /// Raw receiver for callers that drive their own loop
    pub fn receiver(&self, project_id: Snowflake) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.inner
            .channels
            .entry(project_id)
            .or_insert_with(|| broadcast::channel(self.inner.buffer).0)
            .subscribe()
    }

    /// Number of live receivers for a project
    pub fn subscriber_count(&self, project_id: Snowflake) -> usize {
        self.inner
            .channels
            .get(&project_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Last sequence number stamped by this bridge
    pub fn seq(&self) -> u64 {
        self.inner.seq.load(Ordering::SeqCst)
    }

    /// Recompute the view a committed mutation touched and fan it out
    ///
    /// Never fails: the mutation has already committed, so render and relay
    /// problems are logged and the event is delivered without a view.
    #[instrument(skip(self, event), fields(project_id = %event.project_id(), event_type = event.event_type()))]
    pub async fn publish(&self, event: DomainEvent) -> Option<ChangeEvent> {
        let project_id = event.project_id();
        if self.subscriber_count(project_id) == 0 && self.inner.relay.is_none() {
            self.prune(project_id);
            return None;
        }

        let lock = self
            .inner
            .publish_locks
            .entry(project_id)
            .or_default()
            .clone();
        let change = {
            let _guard = lock.lock().await;
            self.render_and_send(&event).await
        };
        drop(lock);
        self.release_lock(project_id);

        Some(change)
    }

    async fn render_and_send(&self, event: &DomainEvent) -> ChangeEvent {
        let view = match self.render(event).await {
            Ok(view) => Some(view),
            Err(e) => {
                warn!(error = %e, "Could not recompute view for change event");
                None
            }
        };

        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let change = ChangeEvent::new(seq, event, view);
        self.deliver(change.clone());

        if let Some(relay) = &self.inner.relay {
            if let Err(e) = relay.relay(&change).await {
                warn!(seq, error = %e, "Change event relay failed");
            }
        }
        change
    }

    /// Forget the project's publish lock once no publisher holds it
    fn release_lock(&self, project_id: Snowflake) {
        self.inner
            .publish_locks
            .remove_if(&project_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Fan an already-computed event out to local subscribers
    ///
    /// Used for events relayed from other processes. Returns how many
    /// subscribers received it.
    pub fn deliver(&self, event: ChangeEvent) -> usize {
        let project_id = event.project_id;
        let delivered = match self.inner.channels.get(&project_id) {
            Some(sender) => sender.send(Arc::new(event)).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            self.prune(project_id);
        }
        debug!(project_id = %project_id, delivered, "Change event delivered");
        delivered
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.inner.publish_locks.len()
    }

    fn prune(&self, project_id: Snowflake) {
        self.inner
            .channels
            .remove_if(&project_id, |_, sender| sender.receiver_count() == 0);
    }

    async fn render(&self, event: &DomainEvent) -> ServiceResult<ViewPayload> {
        let reader = &self.inner.reader;

        match event {
            DomainEvent::ReactionAdded(e)
            | DomainEvent::ReactionModified(e)
            | DomainEvent::ReactionRemoved(e) => {
                let summary = reader.summary(e.project_id, None).await?;
                let user = reader.decorator().profiles().get(e.user_id).await;
                Ok(ViewPayload::Reactions(ReactionChangeView {
                    summary,
                    user: Some(AuthorView::from(user)),
                    previous: e.previous,
                    current: e.current,
                }))
            }
            DomainEvent::CountersReconciled(e) => {
                let summary = reader.summary(e.project_id, None).await?;
                Ok(ViewPayload::Reactions(ReactionChangeView {
                    summary,
                    user: None,
                    previous: None,
                    current: None,
                }))
            }
            DomainEvent::CommentAdded(e) | DomainEvent::CommentModified(e) => {
                Ok(ViewPayload::Comment(reader.comment(e.comment_id).await?))
            }
            DomainEvent::CommentRemoved(e) => {
                let thread = match e.parent_comment_id {
                    Some(parent_id) => match reader.comment(parent_id).await {
                        Ok(parent) => ThreadView {
                            parent_comment_id: Some(parent_id),
                            parent: Some(parent),
                            comments: reader.replies(parent_id).await?,
                        },
                        // The parent went too (pruned or cascaded).
                        Err(ServiceError::Domain(d)) if d.is_not_found() => ThreadView {
                            parent_comment_id: Some(parent_id),
                            parent: None,
                            comments: Vec::new(),
                        },
                        Err(e) => return Err(e),
                    },
                    None => ThreadView {
                        parent_comment_id: None,
                        parent: None,
                        comments: reader
                            .top_level(e.project_id, CommentPage::default())
                            .await?
                            .comments,
                    },
                };
                Ok(ViewPayload::Thread(thread))
            }
        }
    }
}

/// Live subscription handle; dropping it stops delivery
#[derive(Debug)]
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    project_id: Snowflake,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn project_id(&self) -> Snowflake {
        self.project_id
    }

    /// Stop delivery; events already being handled finish normally
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
