//! Process-local cache backed by a `DashMap`.
//!
//! Expired entries are dropped lazily on read and purged in bulk when the map
//! reaches `max_entries`. If purging frees nothing, the entry closest to
//! expiry is evicted.
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use super::{CacheError, CacheStore, CacheValue};

#[derive(Clone, Debug)]
struct CacheEntry {
    value: CacheValue,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone, Debug)]
pub struct InMemoryCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl InMemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            debug!("Cache full, evicting {}", key);
            self.entries.remove(&key);
        }
    }

    fn make_room(&self, key: &str) {
        if self.entries.contains_key(key) || self.entries.len() < self.max_entries {
            return;
        }
        if self.purge_expired() == 0 {
            self.evict_oldest();
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_CACHE_MAX_ENTRIES)
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<(), CacheError> {
        self.make_room(key);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}
