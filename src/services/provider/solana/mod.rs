//! Solana Provider Module
//!
//! This module provides an abstraction layer over the Solana RPC client,
//! offering the ledger queries the relay pipeline depends on: network
//! identity, blockhash fee quotes, account state, simulation and broadcast.
//!
//! The provider uses the non-blocking `RpcClient` for asynchronous operations
//! and classifies client failures into [`SolanaProviderError`] so transient
//! errors can be retried.
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_response::RpcSimulateTransactionResult,
};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use super::{retry_rpc_call, RetryConfig};

/// Utility function to match error patterns by normalizing both strings.
/// Removes spaces and converts to lowercase for flexible matching.
fn matches_error_pattern(error_msg: &str, pattern: &str) -> bool {
    let normalized_msg = error_msg.to_lowercase().replace(' ', "");
    let normalized_pattern = pattern.to_lowercase().replace(' ', "");
    normalized_msg.contains(&normalized_pattern)
}

/// Errors that can occur when interacting with the Solana provider.
///
/// Use `is_transient()` to determine if an error should be retried.
#[derive(Error, Debug, Serialize)]
pub enum SolanaProviderError {
    /// Network/IO error (transient - connection issues, timeouts)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// RPC protocol error (transient - node lag, sync pending)
    #[error("RPC error: {0}")]
    RpcError(String),

    /// HTTP request error with status code
    #[error("Request error (HTTP {status_code}): {error}")]
    RequestError { error: String, status_code: u16 },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Network configuration error: {0}")]
    NetworkConfiguration(String),

    #[error("Insufficient funds for transaction: {0}")]
    InsufficientFunds(String),

    #[error("Blockhash not found or expired: {0}")]
    BlockhashNotFound(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Transaction already processed: {0}")]
    AlreadyProcessed(String),
}

impl SolanaProviderError {
    /// Determines if this error is transient (can retry) or permanent (should fail).
    ///
    /// **Transient:** `NetworkError`, `RpcError`, `BlockhashNotFound`, and
    /// `RequestError` with a retriable status code (5xx except 501/505, 408, 425, 429).
    ///
    /// **Permanent:** everything else.
    pub fn is_transient(&self) -> bool {
        match self {
            SolanaProviderError::NetworkError(_) => true,
            SolanaProviderError::RpcError(_) => true,
            SolanaProviderError::BlockhashNotFound(_) => true,

            SolanaProviderError::RequestError { status_code, .. } => match *status_code {
                501 | 505 => false,
                500 | 502..=504 | 506..=599 => true,
                408 | 425 | 429 => true,
                _ => false,
            },

            SolanaProviderError::InsufficientFunds(_) => false,
            SolanaProviderError::InvalidTransaction(_) => false,
            SolanaProviderError::AlreadyProcessed(_) => false,
            SolanaProviderError::InvalidAddress(_) => false,
            SolanaProviderError::NetworkConfiguration(_) => false,
        }
    }

    /// Classifies a Solana RPC client error into the appropriate error variant.
    pub fn from_rpc_error(error: ClientError) -> Self {
        match error.kind() {
            ClientErrorKind::Io(_) => SolanaProviderError::NetworkError(error.to_string()),

            ClientErrorKind::Reqwest(reqwest_err) => {
                if let Some(status) = reqwest_err.status() {
                    SolanaProviderError::RequestError {
                        error: error.to_string(),
                        status_code: status.as_u16(),
                    }
                } else {
                    SolanaProviderError::NetworkError(error.to_string())
                }
            }

            ClientErrorKind::RpcError(rpc_err) => {
                let rpc_err_str = format!("{rpc_err}");
                Self::from_rpc_response_error(&rpc_err_str, &error)
            }

            ClientErrorKind::TransactionError(tx_error) => {
                Self::from_transaction_error(tx_error, &error)
            }

            ClientErrorKind::Custom(msg) => Self::from_rpc_response_error(msg, &error),

            _ => SolanaProviderError::RpcError(error.to_string()),
        }
    }

    /// Classifies RPC response errors using Solana JSON-RPC error codes, falling
    /// back to message matching for unknown codes.
    fn from_rpc_response_error(rpc_err: &str, full_error: &ClientError) -> Self {
        let message = full_error.to_string();

        if rpc_err.contains("-32002") {
            // Preflight simulation failure
            if matches_error_pattern(rpc_err, "blockhash not found") {
                SolanaProviderError::BlockhashNotFound(message)
            } else if matches_error_pattern(rpc_err, "insufficient funds") {
                SolanaProviderError::InsufficientFunds(message)
            } else {
                SolanaProviderError::InvalidTransaction(message)
            }
        } else if rpc_err.contains("-32003")
            || rpc_err.contains("-32013")
            || rpc_err.contains("-32015")
            || rpc_err.contains("-32602")
        {
            SolanaProviderError::InvalidTransaction(message)
        } else if rpc_err.contains("-32004")
            || rpc_err.contains("-32005")
            || rpc_err.contains("-32014")
            || rpc_err.contains("-32016")
        {
            SolanaProviderError::RpcError(message)
        } else if rpc_err.contains("-32007") || rpc_err.contains("-32010") {
            SolanaProviderError::NetworkConfiguration(message)
        } else if rpc_err.contains("-32008") {
            SolanaProviderError::BlockhashNotFound(message)
        } else if rpc_err.contains("-32009") {
            SolanaProviderError::AlreadyProcessed(message)
        } else if matches_error_pattern(rpc_err, "insufficient funds") {
            SolanaProviderError::InsufficientFunds(message)
        } else if matches_error_pattern(rpc_err, "blockhash not found") {
            SolanaProviderError::BlockhashNotFound(message)
        } else if matches_error_pattern(rpc_err, "already processed") {
            SolanaProviderError::AlreadyProcessed(message)
        } else {
            SolanaProviderError::RpcError(message)
        }
    }

    fn from_transaction_error(tx_error: &TransactionError, full_error: &ClientError) -> Self {
        let message = full_error.to_string();
        match tx_error {
            TransactionError::InsufficientFundsForFee
            | TransactionError::InsufficientFundsForRent { .. } => {
                SolanaProviderError::InsufficientFunds(message)
            }
            TransactionError::BlockhashNotFound => SolanaProviderError::BlockhashNotFound(message),
            TransactionError::AlreadyProcessed => SolanaProviderError::AlreadyProcessed(message),
            TransactionError::AccountInUse
            | TransactionError::AccountLoadedTwice
            | TransactionError::ClusterMaintenance => SolanaProviderError::RpcError(message),
            _ => SolanaProviderError::InvalidTransaction(message),
        }
    }
}

/// Result of a dry-run of a signed transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationOutcome {
    /// Execution error reported by the node, if any
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

impl SimulationOutcome {
    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }
}

impl From<RpcSimulateTransactionResult> for SimulationOutcome {
    fn from(result: RpcSimulateTransactionResult) -> Self {
        Self {
            err: result.err.map(|e| format!("{e:?}")),
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        }
    }
}

/// A trait that abstracts the Solana ledger operations used by the relay.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SolanaProviderTrait: Send + Sync {
    /// Endpoint identity, used to scope cached network data.
    fn rpc_url(&self) -> String;

    /// Retrieves the genesis hash identifying the cluster.
    async fn get_genesis_hash(&self) -> Result<Hash, SolanaProviderError>;

    /// Gets the latest blockhash.
    async fn get_latest_blockhash(&self) -> Result<Hash, SolanaProviderError>;

    /// Per-signature fee quoted for `blockhash`, or `None` if the node does not
    /// know the blockhash (stale, or the node is behind).
    async fn get_fee_for_blockhash(
        &self,
        blockhash: &Hash,
    ) -> Result<Option<u64>, SolanaProviderError>;

    /// Get the fee for a message
    async fn get_fee_for_message(&self, message: &Message) -> Result<u64, SolanaProviderError>;

    /// Retrieves account data for the given pubkey, failing if it does not exist.
    async fn get_account_from_pubkey(&self, pubkey: &Pubkey)
        -> Result<Account, SolanaProviderError>;

    /// Retrieves account data for the given pubkey, `None` if it does not exist.
    async fn get_account_if_exists(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, SolanaProviderError>;

    /// Retrieves the minimum balance for rent exemption for the given data size.
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_size: usize,
    ) -> Result<u64, SolanaProviderError>;

    /// Simulates a signed transaction without committing it.
    async fn simulate_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<SimulationOutcome, SolanaProviderError>;

    /// Broadcasts a fully signed transaction and waits for confirmation.
    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, SolanaProviderError>;
}

pub struct SolanaProvider {
    client: Arc<RpcClient>,
    rpc_url: String,
    commitment: CommitmentConfig,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl std::fmt::Debug for SolanaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaProvider")
            .field("rpc_url", &self.rpc_url)
            .field("commitment", &self.commitment)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SolanaProvider {
    pub fn new(
        rpc_url: &str,
        timeout_seconds: u64,
        retry_config: RetryConfig,
    ) -> Result<Self, SolanaProviderError> {
        Self::new_with_commitment(
            rpc_url,
            timeout_seconds,
            CommitmentConfig::confirmed(),
            retry_config,
        )
    }

    /// Creates a new SolanaProvider for a single RPC endpoint.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - HTTP(S) URL of the RPC node
    /// * `timeout_seconds` - Request timeout
    /// * `commitment` - Commitment level used for queries
    /// * `retry_config` - Backoff settings for transient failures
    pub fn new_with_commitment(
        rpc_url: &str,
        timeout_seconds: u64,
        commitment: CommitmentConfig,
        retry_config: RetryConfig,
    ) -> Result<Self, SolanaProviderError> {
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            return Err(SolanaProviderError::NetworkConfiguration(format!(
                "Invalid RPC URL: {rpc_url}"
            )));
        }

        let timeout = Duration::from_secs(timeout_seconds);
        let client =
            RpcClient::new_with_timeout_and_commitment(rpc_url.to_string(), timeout, commitment);

        Ok(Self {
            client: Arc::new(client),
            rpc_url: rpc_url.to_string(),
            commitment,
            timeout,
            retry_config,
        })
    }

    async fn retry<T, F, Fut>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, SolanaProviderError>
    where
        F: Fn(Arc<RpcClient>) -> Fut,
        Fut: std::future::Future<Output = Result<T, SolanaProviderError>>,
    {
        retry_rpc_call(
            operation_name,
            &self.retry_config,
            |e: &SolanaProviderError| e.is_transient(),
            || operation(self.client.clone()),
        )
        .await
    }
}

#[async_trait]
impl SolanaProviderTrait for SolanaProvider {
    fn rpc_url(&self) -> String {
        self.rpc_url.clone()
    }

    async fn get_genesis_hash(&self) -> Result<Hash, SolanaProviderError> {
        self.retry("get_genesis_hash", |client| async move {
            client
                .get_genesis_hash()
                .await
                .map_err(SolanaProviderError::from_rpc_error)
        })
        .await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, SolanaProviderError> {
        self.retry("get_latest_blockhash", |client| async move {
            client
                .get_latest_blockhash()
                .await
                .map_err(SolanaProviderError::from_rpc_error)
        })
        .await
    }

    async fn get_fee_for_blockhash(
        &self,
        blockhash: &Hash,
    ) -> Result<Option<u64>, SolanaProviderError> {
        let commitment = self.commitment;
        let is_valid = self
            .retry("is_blockhash_valid", |client| async move {
                client
                    .is_blockhash_valid(blockhash, commitment)
                    .await
                    .map_err(SolanaProviderError::from_rpc_error)
            })
            .await?;

        if !is_valid {
            return Ok(None);
        }

        // A message with a single signer and no instructions costs exactly one
        // signature at this blockhash.
        let message = Message::new_with_blockhash(&[], Some(&Pubkey::default()), blockhash);
        self.get_fee_for_message(&message).await.map(Some)
    }

    async fn get_fee_for_message(&self, message: &Message) -> Result<u64, SolanaProviderError> {
        self.retry("get_fee_for_message", |client| async move {
            client
                .get_fee_for_message(message)
                .await
                .map_err(SolanaProviderError::from_rpc_error)
        })
        .await
    }

    async fn get_account_from_pubkey(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Account, SolanaProviderError> {
        self.get_account_if_exists(pubkey).await?.ok_or_else(|| {
            SolanaProviderError::InvalidAddress(format!("Account {pubkey} not found"))
        })
    }

    async fn get_account_if_exists(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, SolanaProviderError> {
        let commitment = self.commitment;
        self.retry("get_account_with_commitment", |client| async move {
            client
                .get_account_with_commitment(pubkey, commitment)
                .await
                .map(|response| response.value)
                .map_err(SolanaProviderError::from_rpc_error)
        })
        .await
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_size: usize,
    ) -> Result<u64, SolanaProviderError> {
        self.retry("get_minimum_balance_for_rent_exemption", |client| async move {
            client
                .get_minimum_balance_for_rent_exemption(data_size)
                .await
                .map_err(SolanaProviderError::from_rpc_error)
        })
        .await
    }

    async fn simulate_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<SimulationOutcome, SolanaProviderError> {
        self.retry("simulate_transaction", |client| async move {
            client
                .simulate_transaction(transaction)
                .await
                .map(|response| SimulationOutcome::from(response.value))
                .map_err(SolanaProviderError::from_rpc_error)
        })
        .await
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, SolanaProviderError> {
        // Not retried: a transport failure here may hide a landed transaction.
        self.client
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(SolanaProviderError::from_rpc_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_http_url() {
        let result = SolanaProvider::new("ws://localhost:8900", 10, RetryConfig::default());
        assert!(matches!(
            result,
            Err(SolanaProviderError::NetworkConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_new_keeps_rpc_url() {
        let provider =
            SolanaProvider::new("http://localhost:8899", 10, RetryConfig::default()).unwrap();
        assert_eq!(provider.rpc_url(), "http://localhost:8899");
    }

    #[test]
    fn test_is_transient() {
        assert!(SolanaProviderError::NetworkError("x".into()).is_transient());
        assert!(SolanaProviderError::BlockhashNotFound("x".into()).is_transient());
        assert!(SolanaProviderError::RequestError {
            error: "x".into(),
            status_code: 429
        }
        .is_transient());
        assert!(!SolanaProviderError::RequestError {
            error: "x".into(),
            status_code: 404
        }
        .is_transient());
        assert!(!SolanaProviderError::InvalidTransaction("x".into()).is_transient());
        assert!(!SolanaProviderError::AlreadyProcessed("x".into()).is_transient());
    }

    #[test]
    fn test_from_rpc_error_custom_message() {
        let error = ClientError::from(ClientErrorKind::Custom(
            "RPC response error -32009: already processed".to_string(),
        ));
        assert!(matches!(
            SolanaProviderError::from_rpc_error(error),
            SolanaProviderError::AlreadyProcessed(_)
        ));

        let error = ClientError::from(ClientErrorKind::Custom("blockhash not found".to_string()));
        assert!(matches!(
            SolanaProviderError::from_rpc_error(error),
            SolanaProviderError::BlockhashNotFound(_)
        ));
    }

    #[test]
    fn test_from_rpc_error_transaction_error() {
        let error = ClientError::from(ClientErrorKind::TransactionError(
            TransactionError::InsufficientFundsForFee,
        ));
        assert!(matches!(
            SolanaProviderError::from_rpc_error(error),
            SolanaProviderError::InsufficientFunds(_)
        ));
    }

    #[test]
    fn test_simulation_outcome_success() {
        let outcome = SimulationOutcome::default();
        assert!(outcome.is_success());

        let failed = SimulationOutcome {
            err: Some("InstructionError(0, Custom(1))".to_string()),
            ..Default::default()
        };
        assert!(!failed.is_success());
    }
}
