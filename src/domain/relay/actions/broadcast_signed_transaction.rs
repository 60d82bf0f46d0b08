//! Sends a co-signed transaction and waits for confirmation.
use log::warn;
use solana_sdk::{signature::Signature, transaction::Transaction};

use super::*;

impl<P, S, C, W> RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    pub(crate) async fn broadcast_signed_transaction_impl(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, RelayError> {
        if tx.message.account_keys.first() != Some(&self.fee_payer) {
            return Err(RelayError::InvalidFeePayer);
        }
        tx.verify()
            .map_err(|e| RelayError::SignatureVerification(e.to_string()))?;

        self.provider
            .send_and_confirm_transaction(tx)
            .await
            .map_err(|e| {
                warn!("Broadcast of {} failed: {}", tx.signatures[0], e);
                RelayError::from(e)
            })
    }
}
