//! Co-signs a user transaction whose first instruction pays the fee payer a
//! token fee.
//!
//! Pipeline: duplicate message guard, structural checks, drain guard,
//! fee transfer validation, per-source lockout, co-sign, simulate.
use log::{info, warn};
use solana_sdk::transaction::Transaction;

use super::*;
use crate::{
    constants::TRANSFER_LOCKOUT_SCOPE,
    domain::relay::{
        decompile_instructions, mark_message_seen, transaction_key, TransactionValidator,
        TransferValidator,
    },
};

impl<P, S, C, W> RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    pub(crate) async fn sign_if_token_fee_paid_impl(
        &self,
        tx: &Transaction,
    ) -> Result<CosignedTransaction, RelayError> {
        info!("Processing sign request {}", transaction_key(tx));

        if !mark_message_seen(self.cache.as_ref(), tx, self.policy.cache_ttl).await? {
            return Err(RelayError::DuplicateTransaction);
        }

        TransactionValidator::validate_structure(
            tx,
            &self.fee_payer,
            &self.policy,
            self.provider.as_ref(),
        )
        .await?;

        let instructions = decompile_instructions(tx)?;
        TransactionValidator::validate_no_fee_payer_drain(&instructions, &self.fee_payer)?;

        let (transfer, token_fee) =
            TransferValidator::validate(tx, &self.policy.transfer_fees, self.provider.as_ref())
                .await?;

        let lockout = SourceLockout::new(self.cache.as_ref(), TRANSFER_LOCKOUT_SCOPE, &self.policy);
        let lock = lockout.acquire(transfer.source_pubkey()).await?;

        let cosigned = self
            .cosign_and_simulate_locked(tx, &lockout, lock)
            .await
            .inspect_err(|e| warn!("Sign request from {} rejected: {}", transfer.source.pubkey, e))?;

        info!(
            "Signed transaction {} paying {} of {}",
            cosigned.signature, transfer.amount, token_fee.mint
        );
        Ok(cosigned)
    }
}
