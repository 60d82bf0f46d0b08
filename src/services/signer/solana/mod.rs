//! Solana signer implementation for fee payer signing operations.
//!
//! # Architecture
//!
//! ```text
//! SolanaSignTrait
//!   └── LocalSigner (raw key held in memory)
//! ```
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};

use super::SignerError;

mod local_signer;
pub use local_signer::*;

/// Trait defining Solana-specific signing operations
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SolanaSignTrait: Sync + Send {
    /// Returns the public key of the signer
    fn pubkey(&self) -> Pubkey;

    /// Signs a message using the Solana signing scheme
    ///
    /// # Arguments
    ///
    /// * `message` - The message bytes to sign
    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError>;
}

/// Signs a Solana SDK transaction in place by finding the signer's position and
/// adding the signature.
///
/// This helper function:
/// 1. Finds the signer's position in the transaction's account_keys
/// 2. Validates it's marked as a required signer
/// 3. Signs the transaction message
/// 4. Inserts the signature at the correct position
///
/// Signatures already present in other slots are preserved.
pub async fn sign_sdk_transaction<T: SolanaSignTrait + ?Sized>(
    signer: &T,
    transaction: &mut Transaction,
) -> Result<Signature, SignerError> {
    let signer_pubkey = signer.pubkey();

    let signer_index = transaction
        .message
        .account_keys
        .iter()
        .position(|key| *key == signer_pubkey)
        .ok_or_else(|| {
            SignerError::SigningError(
                "Signer public key not found in transaction signers".to_string(),
            )
        })?;

    let num_required = transaction.message.header.num_required_signatures as usize;
    if signer_index >= num_required {
        return Err(SignerError::SigningError(format!(
            "Signer is not marked as a required signer in the transaction (position {} >= {})",
            signer_index, num_required
        )));
    }

    let signature = signer.sign(&transaction.message_data()).await?;

    // Exactly num_required_signatures slots, never shrinking existing ones
    if transaction.signatures.len() < num_required {
        transaction
            .signatures
            .resize(num_required, Signature::default());
    }
    transaction.signatures[signer_index] = signature;

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, message::Message, signature::Keypair, signer::Signer};
    use solana_system_interface::instruction as system_instruction;

    fn transfer_transaction(payer: &Pubkey, from: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(from, &Pubkey::new_unique(), 10);
        let message = Message::new_with_blockhash(&[ix], Some(payer), &Hash::new_unique());
        Transaction::new_unsigned(message)
    }

    #[tokio::test]
    async fn test_sign_sdk_transaction_fills_fee_payer_slot() {
        let fee_payer = Keypair::new();
        let fee_payer_pubkey = fee_payer.pubkey();
        let signer = LocalSigner::new(fee_payer);
        let user = Keypair::new();

        let mut tx = transfer_transaction(&fee_payer_pubkey, &user.pubkey());
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[&user], blockhash);

        let signature = sign_sdk_transaction(&signer, &mut tx).await.unwrap();

        assert_eq!(tx.signatures[0], signature);
        assert!(tx.verify().is_ok());
    }

    #[tokio::test]
    async fn test_sign_sdk_transaction_rejects_unknown_signer() {
        let signer = LocalSigner::new(Keypair::new());
        let mut tx = transfer_transaction(&Pubkey::new_unique(), &Pubkey::new_unique());

        let result = sign_sdk_transaction(&signer, &mut tx).await;
        assert!(matches!(result, Err(SignerError::SigningError(_))));
    }

    #[tokio::test]
    async fn test_sign_sdk_transaction_rejects_non_signer_position() {
        let signer = LocalSigner::new(Keypair::new());
        let payer = Pubkey::new_unique();
        let ix = system_instruction::transfer(&payer, &signer.pubkey(), 10);
        let message = Message::new_with_blockhash(&[ix], Some(&payer), &Hash::new_unique());
        let mut tx = Transaction::new_unsigned(message);

        let result = sign_sdk_transaction(&signer, &mut tx).await;
        assert!(matches!(result, Err(SignerError::SigningError(_))));
    }

    #[tokio::test]
    async fn test_sign_sdk_transaction_propagates_signer_error() {
        let payer = Pubkey::new_unique();
        let mut signer = MockSolanaSignTrait::new();
        signer.expect_pubkey().return_const(payer);
        signer.expect_sign().returning(|_| {
            Box::pin(async { Err(SignerError::SigningError("hsm offline".to_string())) })
        });

        let mut tx = transfer_transaction(&payer, &Pubkey::new_unique());
        let result = sign_sdk_transaction(&signer, &mut tx).await;
        assert!(matches!(result, Err(SignerError::SigningError(_))));
    }
}
