//! Fee payer commitments to a proposed message.
//!
//! A token is the fee payer's signature over `sha256(purpose ‖ message)`. It
//! is issued with a relay-built transaction and must match again when the
//! user returns that transaction for the final signature, so the message
//! cannot be swapped in between.
use solana_sdk::{message::Message, signature::Signature};
use std::str::FromStr;

use super::RelayError;
use crate::{services::SolanaSignTrait, utils::sha256};

#[derive(Debug, Clone)]
pub struct MessageToken {
    key: String,
    message_bytes: Vec<u8>,
}

impl MessageToken {
    pub fn new(key: impl Into<String>, message: &Message) -> Self {
        Self {
            key: key.into(),
            message_bytes: message.serialize(),
        }
    }

    fn digest(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(self.key.len() + self.message_bytes.len());
        data.extend_from_slice(self.key.as_bytes());
        data.extend_from_slice(&self.message_bytes);
        sha256(&data)
    }

    /// Base58 encoded fee payer signature over the digest.
    pub async fn compile<S: SolanaSignTrait + ?Sized>(
        &self,
        signer: &S,
    ) -> Result<String, RelayError> {
        let signature = signer.sign(&self.digest()).await?;
        Ok(signature.to_string())
    }

    /// Whether `token` is exactly the token this message compiles to.
    ///
    /// A token that is not a base58 signature is rejected outright.
    pub async fn verify<S: SolanaSignTrait + ?Sized>(
        &self,
        token: &str,
        signer: &S,
    ) -> Result<bool, RelayError> {
        let presented =
            Signature::from_str(token).map_err(|_| RelayError::InvalidMessageToken)?;
        let expected = signer.sign(&self.digest()).await?;
        Ok(expected == presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LocalSigner;
    use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Keypair};
    use solana_system_interface::instruction as system_instruction;

    fn message(lamports: u64) -> Message {
        let payer = Pubkey::new_unique();
        let ix = system_instruction::transfer(&Pubkey::new_unique(), &payer, lamports);
        Message::new_with_blockhash(&[ix], Some(&payer), &Hash::new_unique())
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let signer = LocalSigner::new(Keypair::new());
        let message = message(100);
        let token = MessageToken::new("test-transaction", &message)
            .compile(&signer)
            .await
            .unwrap();

        let signature = Signature::from_str(&token).unwrap();
        let digest = MessageToken::new("test-transaction", &message).digest();
        assert!(signature.verify(signer.pubkey().as_ref(), &digest));

        assert!(MessageToken::new("test-transaction", &message)
            .verify(&token, &signer)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_token_is_bound_to_key_and_message() {
        let signer = LocalSigner::new(Keypair::new());
        let original = message(100);
        let token = MessageToken::new("whirlpools-swap", &original)
            .compile(&signer)
            .await
            .unwrap();

        assert!(!MessageToken::new("other-purpose", &original)
            .verify(&token, &signer)
            .await
            .unwrap());
        assert!(!MessageToken::new("whirlpools-swap", &message(50))
            .verify(&token, &signer)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_token_is_bound_to_fee_payer() {
        let message = message(100);
        let token = MessageToken::new("k", &message)
            .compile(&LocalSigner::new(Keypair::new()))
            .await
            .unwrap();

        assert!(!MessageToken::new("k", &message)
            .verify(&token, &LocalSigner::new(Keypair::new()))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let signer = LocalSigner::new(Keypair::new());
        let token = MessageToken::new("k", &message(100));

        assert!(matches!(
            token.verify("not-a-signature!", &signer).await,
            Err(RelayError::InvalidMessageToken)
        ));
        assert!(matches!(
            token.verify("", &signer).await,
            Err(RelayError::InvalidMessageToken)
        ));
    }
}
