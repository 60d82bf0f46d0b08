//! Signing services.
//!
//! The relay co-signs as fee payer with a single hot key. The signer is kept
//! behind [`solana::SolanaSignTrait`] so remote key backends can be added
//! without touching the validation pipeline.
use serde::Serialize;
use thiserror::Error;

pub mod solana;
pub use solana::*;

#[derive(Error, Debug, Serialize)]
pub enum SignerError {
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),

    #[error("Invalid key format: {0}")]
    KeyError(String),
}
