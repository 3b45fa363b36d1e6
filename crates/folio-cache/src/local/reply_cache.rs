use dashmap::DashMap;
use folio_core::{Comment, Snowflake};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CachedReplies {
    replies: Arc<Vec<Comment>>,
    stored_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Invalidation {
    stamp: u64,
    at: Instant,
}

/// Proof that a fill started after the last invalidation of its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FillTicket {
    parent_id: Snowflake,
    stamp: u64,
    issued_at: Instant,
}

/// Reply lists keyed by parent comment
///
/// Tickets and invalidations share one clock. A fill is rejected when its
/// key was invalidated after the ticket was taken, so a slow read can never
/// re-insert a list that is missing a reply added meanwhile. Tickets live
/// no longer than the TTL, which bounds how long invalidation records must
/// be kept.
#[derive(Debug)]
pub struct ReplyCache {
    ttl: Duration,
    entries: DashMap<Snowflake, CachedReplies>,
    invalidations: DashMap<Snowflake, Invalidation>,
    clock: AtomicU64,
}

impl ReplyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            invalidations: DashMap::new(),
            clock: AtomicU64::new(1),
        }
    }

    /// Cached replies of `parent_id` if present and within the TTL
    pub fn get(&self, parent_id: Snowflake) -> Option<Arc<Vec<Comment>>> {
        let entry = self.entries.get(&parent_id)?;
        if entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.replies.clone())
    }

    /// Take before reading the store for `parent_id`
    pub fn ticket(&self, parent_id: Snowflake) -> FillTicket {
        FillTicket {
            parent_id,
            stamp: self.clock.fetch_add(1, Ordering::SeqCst),
            issued_at: Instant::now(),
        }
    }

    /// Store a fetched list unless the key was invalidated after `ticket`
    /// was taken or the ticket outlived the TTL. Returns whether the list
    /// was stored.
    pub fn fill(&self, ticket: FillTicket, replies: Vec<Comment>) -> bool {
        if ticket.issued_at.elapsed() > self.ttl {
            return false;
        }

        // Holding the entry slot orders this check against `invalidate`
        let slot = self.entries.entry(ticket.parent_id);
        let invalidated_since = self
            .invalidations
            .get(&ticket.parent_id)
            .is_some_and(|i| i.stamp > ticket.stamp);
        if invalidated_since {
            return false;
        }
        slot.insert(CachedReplies {
            replies: Arc::new(replies),
            stored_at: Instant::now(),
        });
        true
    }

    /// Drop the cached list for `parent_id` and reject in-flight fills
    pub fn invalidate(&self, parent_id: Snowflake) {
        let stamp = self.clock.fetch_add(1, Ordering::SeqCst);
        self.invalidations.insert(
            parent_id,
            Invalidation {
                stamp,
                at: Instant::now(),
            },
        );
        self.entries.remove(&parent_id);
    }

    pub fn invalidate_many<I: IntoIterator<Item = Snowflake>>(&self, parent_ids: I) {
        for parent_id in parent_ids {
            self.invalidate(parent_id);
        }
    }

    /// Drop expired lists and invalidation records no live ticket predates
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
        self.invalidations.retain(|_, i| i.at.elapsed() <= self.ttl);
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn tracked_invalidations(&self) -> usize {
        self.invalidations.len()
    }
}
