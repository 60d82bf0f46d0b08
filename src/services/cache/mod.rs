//! Key-value cache with per-entry expiry.
//!
//! The relay uses this as its only cross-request coordination primitive:
//! duplicate-message markers, per-source lockouts, per-mint throttles and the
//! cached genesis hash all live here. Two backends are provided:
//!
//! - [`InMemoryCache`]: process-local, bounded, for single-instance deployments
//! - [`RedisCache`]: shared between relay instances
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod in_memory;
pub use in_memory::*;

mod redis_cache;
pub use redis_cache::*;

#[derive(Error, Debug, Serialize)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache value serialization error: {0}")]
    Serialization(String),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Value stored under a cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CacheValue {
    /// Presence marker for locks
    Flag(bool),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    Text(String),
}

impl CacheValue {
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            CacheValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CacheValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value. The entry
    /// expires after `ttl`.
    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Backend selected at startup.
#[derive(Debug, Clone)]
pub enum CacheStorage {
    InMemory(InMemoryCache),
    Redis(RedisCache),
}

impl CacheStorage {
    pub fn new_in_memory(max_entries: usize) -> Self {
        Self::InMemory(InMemoryCache::new(max_entries))
    }

    pub fn new_redis(cache: RedisCache) -> Self {
        Self::Redis(cache)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            CacheStorage::InMemory(_) => "in_memory",
            CacheStorage::Redis(_) => "redis",
        }
    }
}

#[async_trait]
impl CacheStore for CacheStorage {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        match self {
            CacheStorage::InMemory(cache) => cache.get(key).await,
            CacheStorage::Redis(cache) => cache.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<(), CacheError> {
        match self {
            CacheStorage::InMemory(cache) => cache.set(key, value, ttl).await,
            CacheStorage::Redis(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheStorage::InMemory(cache) => cache.delete(key).await,
            CacheStorage::Redis(cache) => cache.delete(key).await,
        }
    }
}
