use dashmap::DashMap;
use folio_core::{Profile, ProfileStore, Snowflake};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CachedProfile {
    profile: Profile,
    fetched_at: Instant,
}

/// TTL cache in front of a [`ProfileStore`]
///
/// A store failure yields [`Profile::placeholder`] without caching it, so the
/// next lookup retries. A user the store does not know is cached as a
/// placeholder like any other profile.
pub struct ProfileCache {
    store: Arc<dyn ProfileStore>,
    ttl: Duration,
    entries: DashMap<Snowflake, CachedProfile>,
}

impl std::fmt::Debug for ProfileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl ProfileCache {
    pub fn new(store: Arc<dyn ProfileStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            entries: DashMap::new(),
        }
    }

    fn fresh(&self, user_id: Snowflake, now: Instant) -> Option<Profile> {
        self.entries
            .get(&user_id)
            .filter(|entry| now.duration_since(entry.fetched_at) <= self.ttl)
            .map(|entry| entry.profile.clone())
    }

    fn store_entry(&self, profile: Profile, now: Instant) {
        self.entries.insert(
            profile.user_id,
            CachedProfile {
                profile,
                fetched_at: now,
            },
        );
    }

    /// Profile for one user, from cache while fresh
    pub async fn get(&self, user_id: Snowflake) -> Profile {
        if let Some(profile) = self.fresh(user_id, Instant::now()) {
            return profile;
        }

        match self.store.find_profile(user_id).await {
            Ok(found) => {
                let profile = found.unwrap_or_else(|| Profile::placeholder(user_id));
                self.store_entry(profile.clone(), Instant::now());
                profile
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile fetch failed, using placeholder");
                Profile::placeholder(user_id)
            }
        }
    }

    /// Profiles for many users; only missing or stale ids hit the store, in
    /// a single batch call
    pub async fn get_many(&self, user_ids: &[Snowflake]) -> HashMap<Snowflake, Profile> {
        let now = Instant::now();
        let mut result = HashMap::with_capacity(user_ids.len());
        let mut missing = Vec::new();

        for &user_id in user_ids {
            if result.contains_key(&user_id) || missing.contains(&user_id) {
                continue;
            }
            match self.fresh(user_id, now) {
                Some(profile) => {
                    result.insert(user_id, profile);
                }
                None => missing.push(user_id),
            }
        }

        if missing.is_empty() {
            return result;
        }

        debug!(hits = result.len(), misses = missing.len(), "Profile batch lookup");

        match self.store.find_profiles(&missing).await {
            Ok(found) => {
                let fetched_at = Instant::now();
                let mut found: HashMap<Snowflake, Profile> =
                    found.into_iter().map(|p| (p.user_id, p)).collect();
                for user_id in missing {
                    let profile = found
                        .remove(&user_id)
                        .unwrap_or_else(|| Profile::placeholder(user_id));
                    self.store_entry(profile.clone(), fetched_at);
                    result.insert(user_id, profile);
                }
            }
            Err(e) => {
                warn!(count = missing.len(), error = %e, "Profile batch fetch failed, using placeholders");
                for user_id in missing {
                    result.insert(user_id, Profile::placeholder(user_id));
                }
            }
        }

        result
    }

    pub fn invalidate(&self, user_id: Snowflake) {
        self.entries.remove(&user_id);
    }

    /// Drop every entry older than the TTL, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.fetched_at) <= self.ttl);
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
}
