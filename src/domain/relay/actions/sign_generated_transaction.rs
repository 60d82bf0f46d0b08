//! Co-signs a transaction the relay built earlier, such as a swap, once the
//! user has signed it.
//!
//! The message token issued with the transaction must match the message
//! exactly. Each message is signed at most once.
use log::{info, warn};
use solana_sdk::transaction::Transaction;

use super::*;
use crate::domain::relay::{mark_message_seen, MessageToken, TransactionValidator};

impl<P, S, C, W> RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    pub(crate) async fn sign_generated_transaction_impl(
        &self,
        tx: &Transaction,
        message_token: &str,
    ) -> Result<CosignedTransaction, RelayError> {
        info!("Processing sign request for generated transaction");

        let token = MessageToken::new(self.swap_provider.message_token_key(), &tx.message);
        if !token.verify(message_token, self.signer.as_ref()).await? {
            warn!("Rejecting generated transaction with mismatched message token");
            return Err(RelayError::InvalidMessageToken);
        }

        if !mark_message_seen(self.cache.as_ref(), tx, self.policy.cache_ttl).await? {
            return Err(RelayError::DuplicateSignatureRequest);
        }

        if tx.message.header.num_required_signatures < 2 {
            return Err(RelayError::NotEnoughSigners);
        }

        TransactionValidator::validate_structure(
            tx,
            &self.fee_payer,
            &self.policy,
            self.provider.as_ref(),
        )
        .await?;

        let cosigned = self.cosign_and_simulate(tx).await?;
        info!("Signed generated transaction {}", cosigned.signature);
        Ok(cosigned)
    }
}
