use color_eyre::Result;
use log::info;

use crate::{
    config::ServerConfig,
    services::{CacheStorage, RedisCache},
};

/// Builds the cache backend selected by the server configuration.
///
/// Uses Redis when `REDIS_URL` is set, otherwise a bounded in-memory cache.
/// The Redis connection is established eagerly so a bad URL fails startup.
pub async fn initialize_cache_storage(config: &ServerConfig) -> Result<CacheStorage> {
    match &config.redis_url {
        Some(redis_url) => {
            let cache = RedisCache::connect(redis_url, config.redis_key_prefix.clone())
                .await
                .map_err(|e| eyre::eyre!("Failed to connect to Redis: {}", e))?;
            info!("Using Redis cache with key prefix {}", config.redis_key_prefix);
            Ok(CacheStorage::new_redis(cache))
        }
        None => {
            info!(
                "Using in-memory cache (max {} entries)",
                config.cache_max_entries
            );
            Ok(CacheStorage::new_in_memory(config.cache_max_entries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_config(redis_url: Option<String>) -> ServerConfig {
        ServerConfig {
            rpc_url: "http://localhost:8899".to_string(),
            rpc_timeout_seconds: 30,
            fee_payer_secret_key: "secret".to_string(),
            config_file_path: "./config/config.json".to_string(),
            redis_url,
            redis_key_prefix: "test".to_string(),
            cache_ttl_seconds: 120,
            cache_max_entries: 10,
            provider_max_retries: 3,
            provider_retry_base_delay_ms: 100,
            create_fee_accounts: false,
        }
    }

    #[tokio::test]
    async fn test_in_memory_without_redis_url() {
        let storage = initialize_cache_storage(&server_config(None)).await.unwrap();
        assert_eq!(storage.backend_name(), "in_memory");
    }

    #[tokio::test]
    #[ignore = "Requires active Redis instance"]
    async fn test_redis_with_url() {
        let storage =
            initialize_cache_storage(&server_config(Some("redis://127.0.0.1:6379".to_string())))
                .await
                .unwrap();
        assert_eq!(storage.backend_name(), "redis");
    }
}
