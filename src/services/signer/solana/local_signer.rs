//! # Solana Local Signer Implementation
//!
//! Signs with an ed25519 keypair held in process memory. The secret is loaded
//! once at startup from a base58 encoded 64-byte secret key.
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{keypair_from_seed, Keypair, Signature},
    signer::Signer,
};

use super::SolanaSignTrait;
use crate::services::SignerError;

pub struct LocalSigner {
    keypair: Keypair,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

impl LocalSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Builds a signer from a base58 encoded 64-byte secret key (seed followed
    /// by public key).
    pub fn from_base58_secret(secret: &str) -> Result<Self, SignerError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| SignerError::KeyError(format!("Invalid base58 secret key: {e}")))?;

        if bytes.len() != 64 {
            return Err(SignerError::KeyError(format!(
                "Secret key must be 64 bytes, got {}",
                bytes.len()
            )));
        }

        let keypair = keypair_from_seed(&bytes[..32])
            .map_err(|e| SignerError::KeyError(format!("Invalid secret key seed: {e}")))?;

        if keypair.pubkey().as_ref() != &bytes[32..] {
            return Err(SignerError::KeyError(
                "Public key does not match secret key".to_string(),
            ));
        }

        Ok(Self { keypair })
    }
}

#[async_trait]
impl SolanaSignTrait for LocalSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        Ok(self.keypair.sign_message(message))
    }
}
