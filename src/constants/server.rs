//! Defaults for the bootstrap process environment.

pub const DEFAULT_CONFIG_DIR: &str = "./config";

pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.json";

/// Namespace for every key the relay writes to Redis
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "relayer";
