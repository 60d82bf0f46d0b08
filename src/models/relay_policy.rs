use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_LAMPORTS_PER_SIGNATURE, DEFAULT_MAX_SIGNATURES,
    DEFAULT_SAME_MINT_TIMEOUT_MS, DEFAULT_SAME_SOURCE_TIMEOUT_MS,
};

use super::FeeTable;

/// How the per-source lock is held once a fee transfer passes validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockoutPolicy {
    /// Record the time of the accepted transfer and reject the source until
    /// the cooldown elapses. The record is never released early.
    #[default]
    HardLockout,
    /// Lock the source while the request is in flight and release it when the
    /// request completes, whatever the outcome.
    HoldDuringFlight,
}

/// Immutable settings that drive every relay action.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayPolicy {
    pub max_signatures: usize,
    /// Highest per-signature network fee the fee payer accepts, in lamports
    pub lamports_per_signature: u64,
    pub same_source_timeout: Duration,
    pub same_mint_timeout: Duration,
    pub lockout_policy: LockoutPolicy,
    pub cache_ttl: Duration,
    pub require_mainnet_for_swap: bool,
    pub transfer_fees: FeeTable,
    pub create_account_fees: FeeTable,
    pub swap_fees: FeeTable,
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self {
            max_signatures: DEFAULT_MAX_SIGNATURES,
            lamports_per_signature: DEFAULT_LAMPORTS_PER_SIGNATURE,
            same_source_timeout: Duration::from_millis(DEFAULT_SAME_SOURCE_TIMEOUT_MS),
            same_mint_timeout: Duration::from_millis(DEFAULT_SAME_MINT_TIMEOUT_MS),
            lockout_policy: LockoutPolicy::default(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            require_mainnet_for_swap: true,
            transfer_fees: FeeTable::default(),
            create_account_fees: FeeTable::default(),
            swap_fees: FeeTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockout_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&LockoutPolicy::HoldDuringFlight).unwrap(),
            "\"hold_during_flight\""
        );
        let parsed: LockoutPolicy = serde_json::from_str("\"hard_lockout\"").unwrap();
        assert_eq!(parsed, LockoutPolicy::HardLockout);
    }

    #[test]
    fn test_default_policy_uses_hard_lockout() {
        let policy = RelayPolicy::default();
        assert_eq!(policy.lockout_policy, LockoutPolicy::HardLockout);
        assert_eq!(policy.same_source_timeout, Duration::from_millis(5000));
        assert_eq!(policy.same_mint_timeout, Duration::from_millis(3000));
    }
}
