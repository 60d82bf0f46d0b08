//! Co-signs `[fee transfer, create associated token account]` where the fee
//! payer funds the new account.
//!
//! Pipeline: duplicate message guard, structural checks, account-init
//! validation, drain guard over the fee transfer, fee transfer validation,
//! per-source lockout, co-sign, simulate.
use log::{info, warn};
use solana_sdk::transaction::Transaction;

use super::*;
use crate::{
    constants::CREATE_ACCOUNT_LOCKOUT_SCOPE,
    domain::relay::{
        decompile_instructions, mark_message_seen, transaction_key, AccountInitValidator,
        TransactionValidator, TransferValidator,
    },
};

impl<P, S, C, W> RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    pub(crate) async fn create_account_if_token_fee_paid_impl(
        &self,
        tx: &Transaction,
    ) -> Result<CosignedTransaction, RelayError> {
        info!("Processing create account request {}", transaction_key(tx));

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

        let account = AccountInitValidator::validate(
            tx,
            &self.fee_payer,
            self.provider.as_ref(),
            self.cache.as_ref(),
            self.policy.cache_ttl,
        )
        .await?;

        // The account instruction legitimately references the fee payer as
        // funder and was matched exactly above
        let instructions = decompile_instructions(tx)?;
        TransactionValidator::validate_no_fee_payer_drain(&instructions[..1], &self.fee_payer)?;

        let (transfer, token_fee) = TransferValidator::validate(
            tx,
            &self.policy.create_account_fees,
            self.provider.as_ref(),
        )
        .await?;

        let lockout = SourceLockout::new(
            self.cache.as_ref(),
            CREATE_ACCOUNT_LOCKOUT_SCOPE,
            &self.policy,
        );
        let lock = lockout.acquire(transfer.source_pubkey()).await?;

        let cosigned = self
            .cosign_and_simulate_locked(tx, &lockout, lock)
            .await
            .inspect_err(|e| warn!("Create account request for {} rejected: {}", account, e))?;

        info!(
            "Signed account creation {} for {} paying {} of {}",
            cosigned.signature, account, transfer.amount, token_fee.mint
        );
        Ok(cosigned)
    }
}
