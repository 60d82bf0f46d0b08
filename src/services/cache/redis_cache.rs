//! Redis implementation of the relay cache.
//!
//! Values are stored JSON encoded under `{prefix}:{key}` with a millisecond
//! expiry, so several relay instances can share duplicate markers and
//! lockouts.
use async_trait::async_trait;
use log::debug;
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use std::{fmt, sync::Arc, time::Duration};

use super::{CacheError, CacheStore, CacheValue};

#[derive(Clone)]
pub struct RedisCache {
    pub client: Arc<ConnectionManager>,
    pub key_prefix: String,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisCache {
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        key_prefix: String,
    ) -> Result<Self, CacheError> {
        if key_prefix.is_empty() {
            return Err(CacheError::Backend(
                "Redis key prefix cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            client: connection_manager,
            key_prefix,
        })
    }

    /// Opens a connection manager for `redis_url` and wraps it.
    pub async fn connect(redis_url: &str, key_prefix: String) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Invalid Redis URL: {e}")))?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Self::new(Arc::new(connection_manager), key_prefix)
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    fn map_redis_error(&self, error: RedisError, operation: &str) -> CacheError {
        debug!("Redis {} failed: {}", operation, error);
        if error.is_io_error() || error.is_connection_dropped() || error.is_timeout() {
            CacheError::Connection(format!("{operation}: {error}"))
        } else {
            CacheError::Backend(format!("{operation}: {error}"))
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let key = self.prefixed_key(key);
        let mut conn = self.client.as_ref().clone();

        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| self.map_redis_error(e, "get"))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| CacheError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<(), CacheError> {
        let key = self.prefixed_key(key);
        let json =
            serde_json::to_string(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.client.as_ref().clone();

        let _: () = conn
            .pset_ex(&key, json, ttl_ms)
            .await
            .map_err(|e| self.map_redis_error(e, "set"))?;

        debug!("Cached {} for {}ms", key, ttl_ms);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let key = self.prefixed_key(key);
        let mut conn = self.client.as_ref().clone();

        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| self.map_redis_error(e, "delete"))?;
        Ok(())
    }
}
