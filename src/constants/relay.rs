//! Defaults for the relay pipeline and its idempotency cache.

/// Interval between fee transfers from the same token source, in milliseconds
pub const DEFAULT_SAME_SOURCE_TIMEOUT_MS: u64 = 5000;

/// Interval between swap requests for the same user and mint, in milliseconds
pub const DEFAULT_SAME_MINT_TIMEOUT_MS: u64 = 3000;

/// Lifetime of duplicate-request and account-creation markers
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 120;

/// Upper bound on entries held by the in-memory cache
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

pub const DEFAULT_MAX_SIGNATURES: usize = 2;

pub const DEFAULT_LAMPORTS_PER_SIGNATURE: u64 = 5000;

// Cache key namespaces
pub const TRANSACTION_KEY_PREFIX: &str = "transaction";
pub const TRANSFER_LOCKOUT_SCOPE: &str = "transfer";
pub const CREATE_ACCOUNT_LOCKOUT_SCOPE: &str = "createAccount";
pub const ACCOUNT_KEY_PREFIX: &str = "account";
pub const SWAP_KEY_PREFIX: &str = "swap";
pub const GENESIS_KEY_PREFIX: &str = "genesis";
