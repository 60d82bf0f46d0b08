//! Fee payer co-signing and the pre-broadcast simulation gate.
use log::{debug, warn};
use solana_sdk::{signature::Signature, transaction::Transaction};

use super::RelayError;
use crate::services::{
    sign_sdk_transaction, SimulationOutcome, SolanaProviderTrait, SolanaSignTrait,
};

/// A transaction carrying the fee payer's signature, in wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct CosignedTransaction {
    /// Fee payer signature, which is also the transaction id
    pub signature: Signature,
    pub raw_transaction: Vec<u8>,
}

/// Adds the fee payer signature to slot 0 and serializes the result.
///
/// Every signature is verified after signing, so a malformed user signature
/// fails here rather than on the network.
pub async fn cosign_transaction<S: SolanaSignTrait + ?Sized>(
    signer: &S,
    tx: &Transaction,
) -> Result<CosignedTransaction, RelayError> {
    let mut signed = tx.clone();
    let signature = sign_sdk_transaction(signer, &mut signed).await?;

    signed
        .verify()
        .map_err(|e| RelayError::SignatureVerification(e.to_string()))?;

    let raw_transaction = bincode::serialize(&signed)
        .map_err(|e| RelayError::TransactionDecode(format!("Failed to serialize: {e}")))?;

    debug!("Co-signed transaction {}", signature);
    Ok(CosignedTransaction {
        signature,
        raw_transaction,
    })
}

/// Dry-runs `raw_transaction` and fails with `SimulationFailed` on any
/// execution error.
///
/// The transaction is decoded afresh from the bytes that would be broadcast.
pub async fn simulate_raw_transaction<P: SolanaProviderTrait + ?Sized>(
    provider: &P,
    raw_transaction: &[u8],
) -> Result<SimulationOutcome, RelayError> {
    let tx: Transaction = bincode::deserialize(raw_transaction)
        .map_err(|e| RelayError::TransactionDecode(e.to_string()))?;

    let outcome = provider.simulate_transaction(&tx).await?;
    if let Some(err) = &outcome.err {
        warn!("Simulation failed: {} (logs: {:?})", err, outcome.logs);
        return Err(RelayError::SimulationFailed(err.clone()));
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{LocalSigner, MockSolanaProviderTrait};
    use solana_sdk::{
        hash::Hash, message::Message, pubkey::Pubkey, signature::Keypair, signer::Signer,
    };
    use solana_system_interface::instruction as system_instruction;

    fn user_signed(fee_payer: &Pubkey, user: &Keypair) -> Transaction {
        let ix = system_instruction::transfer(&user.pubkey(), &Pubkey::new_unique(), 10);
        let message = Message::new_with_blockhash(&[ix], Some(fee_payer), &Hash::new_unique());
        let mut tx = Transaction::new_unsigned(message);
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[user], blockhash);
        tx
    }

    #[tokio::test]
    async fn test_cosign_preserves_user_signature() {
        let signer = LocalSigner::new(Keypair::new());
        let user = Keypair::new();
        let tx = user_signed(&signer.pubkey(), &user);

        let cosigned = cosign_transaction(&signer, &tx).await.unwrap();
        let decoded: Transaction = bincode::deserialize(&cosigned.raw_transaction).unwrap();

        assert_eq!(decoded.signatures[0], cosigned.signature);
        assert_eq!(decoded.signatures[1], tx.signatures[1]);
        assert_eq!(decoded.message, tx.message);
        // The caller's transaction is untouched
        assert_eq!(tx.signatures[0], Signature::default());
    }

    #[tokio::test]
    async fn test_cosign_rejects_forged_user_signature() {
        let signer = LocalSigner::new(Keypair::new());
        let user = Keypair::new();
        let mut tx = user_signed(&signer.pubkey(), &user);
        tx.signatures[1] = Signature::from([9u8; 64]);

        assert!(matches!(
            cosign_transaction(&signer, &tx).await,
            Err(RelayError::SignatureVerification(_))
        ));
    }

    #[tokio::test]
    async fn test_simulate_raw_transaction() {
        let signer = LocalSigner::new(Keypair::new());
        let tx = user_signed(&signer.pubkey(), &Keypair::new());
        let cosigned = cosign_transaction(&signer, &tx).await.unwrap();
        let expected_signature = cosigned.signature;

        let mut provider = MockSolanaProviderTrait::new();
        provider
            .expect_simulate_transaction()
            .withf(move |tx| tx.signatures[0] == expected_signature)
            .times(1)
            .returning(|_| Box::pin(async { Ok(SimulationOutcome::default()) }));

        assert!(simulate_raw_transaction(&provider, &cosigned.raw_transaction)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_simulate_raw_transaction_failure() {
        let mut provider = MockSolanaProviderTrait::new();
        provider.expect_simulate_transaction().returning(|_| {
            Box::pin(async {
                Ok(SimulationOutcome {
                    err: Some("InstructionError(0, Custom(1))".to_string()),
                    logs: vec!["Program log: insufficient funds".to_string()],
                    units_consumed: Some(1200),
                })
            })
        });

        let signer = LocalSigner::new(Keypair::new());
        let tx = user_signed(&signer.pubkey(), &Keypair::new());
        let cosigned = cosign_transaction(&signer, &tx).await.unwrap();

        assert!(matches!(
            simulate_raw_transaction(&provider, &cosigned.raw_transaction).await,
            Err(RelayError::SimulationFailed(err)) if err.contains("Custom(1)")
        ));
    }

    #[tokio::test]
    async fn test_simulate_rejects_garbage_bytes() {
        let provider = MockSolanaProviderTrait::new();
        assert!(matches!(
            simulate_raw_transaction(&provider, &[1, 2, 3]).await,
            Err(RelayError::TransactionDecode(_))
        ));
    }
}
