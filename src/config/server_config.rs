use std::{env, str::FromStr};

use super::ConfigError;
use crate::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_CONFIG_DIR,
    DEFAULT_CONFIG_FILE_NAME, DEFAULT_PROVIDER_MAX_RETRIES, DEFAULT_PROVIDER_RETRY_BASE_DELAY_MS,
    DEFAULT_REDIS_KEY_PREFIX, DEFAULT_RPC_TIMEOUT_SECONDS, DEFAULT_RPC_URL,
};

#[derive(Clone)]
pub struct ServerConfig {
    pub rpc_url: String,
    pub rpc_timeout_seconds: u64,
    /// Base58 encoded 64-byte fee payer keypair
    pub fee_payer_secret_key: String,
    pub config_file_path: String,
    /// Redis is used for the relay cache when set
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: usize,
    pub provider_max_retries: u32,
    pub provider_retry_base_delay_ms: u64,
    /// Create missing fee accounts at startup
    pub create_fee_accounts: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("rpc_timeout_seconds", &self.rpc_timeout_seconds)
            .field("fee_payer_secret_key", &"<redacted>")
            .field("config_file_path", &self.config_file_path)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<redacted>"))
            .field("redis_key_prefix", &self.redis_key_prefix)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("provider_max_retries", &self.provider_max_retries)
            .field(
                "provider_retry_base_delay_ms",
                &self.provider_retry_base_delay_ms,
            )
            .field("create_fee_accounts", &self.create_fee_accounts)
            .finish()
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        let config_file_name =
            env::var("CONFIG_FILE_NAME").unwrap_or_else(|_| DEFAULT_CONFIG_FILE_NAME.to_string());

        Ok(Self {
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            rpc_timeout_seconds: parse_env("RPC_TIMEOUT_SECONDS", DEFAULT_RPC_TIMEOUT_SECONDS)?,
            fee_payer_secret_key: env::var("FEE_PAYER_SECRET_KEY")
                .map_err(|_| ConfigError::MissingEnv("FEE_PAYER_SECRET_KEY".to_string()))?,
            config_file_path: format!(
                "{}/{}",
                config_dir.trim_end_matches('/'),
                config_file_name
            ),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_REDIS_KEY_PREFIX.to_string()),
            cache_ttl_seconds: parse_env("CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS)?,
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES)?,
            provider_max_retries: parse_env("PROVIDER_MAX_RETRIES", DEFAULT_PROVIDER_MAX_RETRIES)?,
            provider_retry_base_delay_ms: parse_env(
                "PROVIDER_RETRY_BASE_DELAY_MS",
                DEFAULT_PROVIDER_RETRY_BASE_DELAY_MS,
            )?,
            create_fee_accounts: parse_env("CREATE_FEE_ACCOUNTS", false)?,
        })
    }
}
