//! Cross-request guards built on the cache.
//!
//! All of these are check-then-set on a shared store. They throttle abuse and
//! suppress obvious races; the ledger remains the final arbiter of conflicting
//! transactions.
use log::{debug, warn};
use solana_sdk::{hash::Hash, pubkey::Pubkey, transaction::Transaction};
use std::{str::FromStr, time::Duration};

use super::RelayError;
use crate::{
    constants::{ACCOUNT_KEY_PREFIX, GENESIS_KEY_PREFIX, MAINNET_BETA_GENESIS_HASH, SWAP_KEY_PREFIX, TRANSACTION_KEY_PREFIX},
    models::{LockoutPolicy, RelayPolicy},
    services::{CacheStore, CacheValue, SolanaProviderTrait},
    utils::{is_within_window, now_ms, sha256_base58},
};

/// Cache key identifying a transaction by the hash of its signable message.
pub fn transaction_key(tx: &Transaction) -> String {
    format!(
        "{}/{}",
        TRANSACTION_KEY_PREFIX,
        sha256_base58(&[&tx.message_data()])
    )
}

/// Marks the transaction's message as seen.
///
/// Returns `false` if it was already marked, meaning an identical message is
/// in flight or was recently processed.
pub async fn mark_message_seen<C: CacheStore + ?Sized>(
    cache: &C,
    tx: &Transaction,
    ttl: Duration,
) -> Result<bool, RelayError> {
    let key = transaction_key(tx);
    if cache.get(&key).await?.is_some() {
        warn!("Duplicate message {}", key);
        return Ok(false);
    }
    cache.set(&key, CacheValue::Flag(true), ttl).await?;
    Ok(true)
}

/// Outcome of acquiring a per-source lock.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLock {
    /// A cooldown timestamp was written; it expires on its own.
    Recorded,
    /// An in-flight flag was written under this key and must be released.
    Held(String),
}

/// Per-source throttle for one action type.
///
/// Hard lockout and hold-during-flight keep their state under different keys,
/// so switching policy never reinterprets an existing entry.
pub struct SourceLockout<'a, C: CacheStore + ?Sized> {
    cache: &'a C,
    scope: &'static str,
    policy: LockoutPolicy,
    cooldown: Duration,
    hold_ttl: Duration,
}

impl<'a, C: CacheStore + ?Sized> SourceLockout<'a, C> {
    pub fn new(cache: &'a C, scope: &'static str, policy: &RelayPolicy) -> Self {
        Self {
            cache,
            scope,
            policy: policy.lockout_policy,
            cooldown: policy.same_source_timeout,
            hold_ttl: policy.cache_ttl,
        }
    }

    pub fn cooldown_key(&self, source: &Pubkey) -> String {
        format!("{}/lastSignature/{}", self.scope, source)
    }

    pub fn in_flight_key(&self, source: &Pubkey) -> String {
        format!("{}/inFlight/{}", self.scope, source)
    }

    /// Fails with `DuplicateTransfer` if `source` is cooling down or has a
    /// request in flight, otherwise claims it.
    pub async fn acquire(&self, source: &Pubkey) -> Result<SourceLock, RelayError> {
        match self.policy {
            LockoutPolicy::HardLockout => {
                let key = self.cooldown_key(source);
                let last = self
                    .cache
                    .get(&key)
                    .await?
                    .and_then(|value| value.as_timestamp());
                if let Some(last) = last {
                    if is_within_window(last, self.cooldown) {
                        warn!("Source {} is cooling down ({})", source, self.scope);
                        return Err(RelayError::DuplicateTransfer(source.to_string()));
                    }
                }
                self.cache
                    .set(&key, CacheValue::Timestamp(now_ms()), self.cooldown)
                    .await?;
                Ok(SourceLock::Recorded)
            }
            LockoutPolicy::HoldDuringFlight => {
                let key = self.in_flight_key(source);
                if self.cache.get(&key).await?.is_some() {
                    warn!("Source {} already has a request in flight ({})", source, self.scope);
                    return Err(RelayError::DuplicateTransfer(source.to_string()));
                }
                self.cache
                    .set(&key, CacheValue::Flag(true), self.hold_ttl)
                    .await?;
                Ok(SourceLock::Held(key))
            }
        }
    }

    /// Clears an in-flight flag. Cooldown records are left to expire.
    pub async fn release(&self, lock: SourceLock) -> Result<(), RelayError> {
        if let SourceLock::Held(key) = lock {
            debug!("Releasing {}", key);
            self.cache.delete(&key).await?;
        }
        Ok(())
    }
}

pub fn account_request_key(blockhash: &Hash, account: &Pubkey) -> String {
    format!("{}/{}_{}", ACCOUNT_KEY_PREFIX, blockhash, account)
}

/// Claims creation of `account` for the lifetime of `blockhash`.
pub async fn acquire_account_request_lock<C: CacheStore + ?Sized>(
    cache: &C,
    blockhash: &Hash,
    account: &Pubkey,
    ttl: Duration,
) -> Result<(), RelayError> {
    let key = account_request_key(blockhash, account);
    if cache.get(&key).await?.is_some() {
        return Err(RelayError::DuplicateAccountRequest(account.to_string()));
    }
    cache.set(&key, CacheValue::Flag(true), ttl).await?;
    Ok(())
}

pub fn swap_request_key(user: &Pubkey, mint: &Pubkey) -> String {
    format!("{}/{}/{}", SWAP_KEY_PREFIX, user, mint)
}

/// Fails with `TooManyRequests` if `user` requested a swap of `mint` less than
/// `interval` ago.
pub async fn check_mint_throttle<C: CacheStore + ?Sized>(
    cache: &C,
    user: &Pubkey,
    mint: &Pubkey,
    interval: Duration,
) -> Result<(), RelayError> {
    let last = cache
        .get(&swap_request_key(user, mint))
        .await?
        .and_then(|value| value.as_timestamp());
    match last {
        Some(last) if is_within_window(last, interval) => Err(RelayError::TooManyRequests),
        _ => Ok(()),
    }
}

pub async fn record_mint_request<C: CacheStore + ?Sized>(
    cache: &C,
    user: &Pubkey,
    mint: &Pubkey,
    interval: Duration,
) -> Result<(), RelayError> {
    cache
        .set(
            &swap_request_key(user, mint),
            CacheValue::Timestamp(now_ms()),
            interval,
        )
        .await?;
    Ok(())
}

pub fn is_mainnet_beta(genesis_hash: &Hash) -> bool {
    genesis_hash.to_string() == MAINNET_BETA_GENESIS_HASH
}

/// Genesis hash of the provider's cluster, cached per RPC endpoint.
pub async fn cached_genesis_hash<P, C>(
    provider: &P,
    cache: &C,
    ttl: Duration,
) -> Result<Hash, RelayError>
where
    P: SolanaProviderTrait + ?Sized,
    C: CacheStore + ?Sized,
{
    let key = format!("{}/{}", GENESIS_KEY_PREFIX, provider.rpc_url());

    let cached = cache
        .get(&key)
        .await?
        .and_then(|value| value.as_text().and_then(|text| Hash::from_str(text).ok()));
    if let Some(hash) = cached {
        return Ok(hash);
    }

    let hash = provider.get_genesis_hash().await?;
    cache
        .set(&key, CacheValue::Text(hash.to_string()), ttl)
        .await?;
    Ok(hash)
}

/// Fails with `WrongNetwork` unless the provider is attached to mainnet-beta.
pub async fn ensure_mainnet_beta<P, C>(provider: &P, cache: &C, ttl: Duration) -> Result<(), RelayError>
where
    P: SolanaProviderTrait + ?Sized,
    C: CacheStore + ?Sized,
{
    let genesis_hash = cached_genesis_hash(provider, cache, ttl).await?;
    if !is_mainnet_beta(&genesis_hash) {
        return Err(RelayError::WrongNetwork(format!(
            "expected mainnet-beta, connected to cluster with genesis hash {genesis_hash}"
        )));
    }
    Ok(())
}
