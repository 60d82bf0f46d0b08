//! # Relay Actions
//!
//! This module defines the `RelayActions` trait, the entry points an external
//! request layer calls. Each action composes the validators, cache policy,
//! co-signer and simulator gate in a fixed order:
//!
//! * `sign_if_token_fee_paid` - co-sign a transaction that pays a token fee
//! * `create_account_if_token_fee_paid` - co-sign a fee payer funded
//!   associated token account creation that pays a token fee
//! * `swap_to_native` - build a token to native swap for the user to sign
//! * `sign_generated_transaction` - co-sign a transaction built by the relay
//! * `broadcast_signed_transaction` - send and confirm a co-signed transaction
mod broadcast_signed_transaction;
mod create_account_if_token_fee_paid;
mod sign_generated_transaction;
mod sign_if_token_fee_paid;
mod swap_to_native;

use async_trait::async_trait;
use log::{info, warn};
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use super::{
    cosign_transaction, simulate_raw_transaction, CosignedTransaction, RelayError, SourceLock,
    SourceLockout,
};
use crate::{
    models::{
        EncodedTransaction, RelayPolicy, SendTransactionRequest, SendTransactionResponse,
        SignGeneratedTransactionRequest, SignTransactionRequest, SignatureResponse,
        SwapToNativeRequest, SwapToNativeResponse,
    },
    services::{
        CacheStorage, CacheStore, LocalSigner, SolanaProvider, SolanaProviderTrait,
        SolanaSignTrait, SwapProviderTrait,
    },
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RelayActions: Send + Sync {
    async fn sign_if_token_fee_paid(
        &self,
        request: SignTransactionRequest,
    ) -> Result<SignatureResponse, RelayError>;
    async fn create_account_if_token_fee_paid(
        &self,
        request: SignTransactionRequest,
    ) -> Result<SignatureResponse, RelayError>;
    async fn swap_to_native(
        &self,
        request: SwapToNativeRequest,
    ) -> Result<SwapToNativeResponse, RelayError>;
    async fn sign_generated_transaction(
        &self,
        request: SignGeneratedTransactionRequest,
    ) -> Result<SignatureResponse, RelayError>;
    async fn broadcast_signed_transaction(
        &self,
        request: SendTransactionRequest,
    ) -> Result<SendTransactionResponse, RelayError>;
}

pub type DefaultProvider = SolanaProvider;
pub type DefaultSigner = LocalSigner;
pub type DefaultCache = CacheStorage;

pub struct RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    pub(crate) policy: RelayPolicy,
    pub(crate) fee_payer: Pubkey,
    pub(crate) provider: Arc<P>,
    pub(crate) signer: Arc<S>,
    pub(crate) cache: Arc<C>,
    pub(crate) swap_provider: Arc<W>,
}

pub type DefaultRelayActionsImpl<W> =
    RelayActionsImpl<DefaultProvider, DefaultSigner, DefaultCache, W>;

impl<P, S, C, W> RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    /// The fee payer is the signer's key.
    pub fn new(
        policy: RelayPolicy,
        provider: Arc<P>,
        signer: Arc<S>,
        cache: Arc<C>,
        swap_provider: Arc<W>,
    ) -> Self {
        let fee_payer = signer.pubkey();
        Self {
            policy,
            fee_payer,
            provider,
            signer,
            cache,
            swap_provider,
        }
    }

    pub fn fee_payer(&self) -> &Pubkey {
        &self.fee_payer
    }

    pub fn policy(&self) -> &RelayPolicy {
        &self.policy
    }

    /// Co-signs and simulates `tx` while `lock` is held, then releases it
    /// whatever the outcome.
    async fn cosign_and_simulate_locked(
        &self,
        tx: &Transaction,
        lockout: &SourceLockout<'_, C>,
        lock: SourceLock,
    ) -> Result<CosignedTransaction, RelayError> {
        let result = self.cosign_and_simulate(tx).await;
        if let Err(e) = lockout.release(lock).await {
            warn!("Failed to release source lock: {}", e);
        }
        result
    }

    async fn cosign_and_simulate(&self, tx: &Transaction) -> Result<CosignedTransaction, RelayError> {
        let cosigned = cosign_transaction(self.signer.as_ref(), tx).await?;
        simulate_raw_transaction(self.provider.as_ref(), &cosigned.raw_transaction).await?;
        Ok(cosigned)
    }
}

fn decode_transaction(encoded: &EncodedTransaction) -> Result<Transaction, RelayError> {
    Ok(Transaction::try_from(encoded)?)
}

fn signature_response(cosigned: CosignedTransaction) -> SignatureResponse {
    SignatureResponse {
        signature: cosigned.signature.to_string(),
        transaction: EncodedTransaction::from_bytes(&cosigned.raw_transaction),
    }
}

#[async_trait]
impl<P, S, C, W> RelayActions for RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    async fn sign_if_token_fee_paid(
        &self,
        request: SignTransactionRequest,
    ) -> Result<SignatureResponse, RelayError> {
        let tx = decode_transaction(&request.transaction)?;
        let cosigned = self.sign_if_token_fee_paid_impl(&tx).await?;
        Ok(signature_response(cosigned))
    }

    async fn create_account_if_token_fee_paid(
        &self,
        request: SignTransactionRequest,
    ) -> Result<SignatureResponse, RelayError> {
        let tx = decode_transaction(&request.transaction)?;
        let cosigned = self.create_account_if_token_fee_paid_impl(&tx).await?;
        Ok(signature_response(cosigned))
    }

    async fn swap_to_native(
        &self,
        request: SwapToNativeRequest,
    ) -> Result<SwapToNativeResponse, RelayError> {
        self.swap_to_native_request_impl(request).await
    }

    async fn sign_generated_transaction(
        &self,
        request: SignGeneratedTransactionRequest,
    ) -> Result<SignatureResponse, RelayError> {
        let tx = decode_transaction(&request.transaction)?;
        let cosigned = self
            .sign_generated_transaction_impl(&tx, &request.message_token)
            .await?;
        Ok(signature_response(cosigned))
    }

    async fn broadcast_signed_transaction(
        &self,
        request: SendTransactionRequest,
    ) -> Result<SendTransactionResponse, RelayError> {
        let tx = decode_transaction(&request.transaction)?;
        let signature = self.broadcast_signed_transaction_impl(&tx).await?;
        info!("Transaction {} confirmed", signature);
        Ok(SendTransactionResponse {
            signature: signature.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::relay::test_setup::*,
        services::{InMemoryCache, MockSwapProviderTrait},
    };

    #[tokio::test]
    async fn test_sign_request_round_trips_encoding() {
        let ctx = TransferTestContext::new();
        let tx = ctx.transfer_transaction(100);
        let actions = RelayActionsImpl::new(
            ctx.policy(),
            Arc::new(ctx.transfer_provider(5000)),
            Arc::new(ctx.signer()),
            Arc::new(InMemoryCache::new(100)),
            Arc::new(MockSwapProviderTrait::new()),
        );

        let response = actions
            .sign_if_token_fee_paid(SignTransactionRequest {
                transaction: EncodedTransaction::try_from(&tx).unwrap(),
            })
            .await
            .unwrap();

        let signed = Transaction::try_from(&response.transaction).unwrap();
        assert_eq!(signed.signatures[0].to_string(), response.signature);
        assert_eq!(signed.message, tx.message);
        assert_eq!(signed.signatures[1], tx.signatures[1]);
        assert!(signed.verify().is_ok());
    }

    #[tokio::test]
    async fn test_undecodable_request_is_rejected() {
        let ctx = TransferTestContext::new();
        let actions = RelayActionsImpl::new(
            ctx.policy(),
            Arc::new(ctx.transfer_provider(5000)),
            Arc::new(ctx.signer()),
            Arc::new(InMemoryCache::new(100)),
            Arc::new(MockSwapProviderTrait::new()),
        );

        let result = actions
            .sign_if_token_fee_paid(SignTransactionRequest {
                transaction: EncodedTransaction::new("0OIl".to_string()),
            })
            .await;

        assert!(matches!(result, Err(RelayError::TransactionDecode(_))));
    }
}
