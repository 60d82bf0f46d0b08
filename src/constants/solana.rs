//! Solana network constants.

/// Genesis hash of the mainnet-beta cluster
pub const MAINNET_BETA_GENESIS_HASH: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d";

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

pub const DEFAULT_RPC_TIMEOUT_SECONDS: u64 = 30;

/// Purpose tag bound into message tokens issued for Whirlpools swaps
pub const WHIRLPOOLS_MESSAGE_TOKEN_KEY: &str = "whirlpools-swap";

pub const DEFAULT_PROVIDER_MAX_RETRIES: u32 = 3;

pub const DEFAULT_PROVIDER_RETRY_BASE_DELAY_MS: u64 = 100;

pub const DEFAULT_PROVIDER_RETRY_MAX_DELAY_MS: u64 = 2000;
