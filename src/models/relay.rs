//! Request and response shapes for the relay actions.
use serde::{Deserialize, Serialize};

use solana_sdk::pubkey::Pubkey;

use super::EncodedTransaction;
use crate::services::SwapQuote;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignTransactionRequest {
    pub transaction: EncodedTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureResponse {
    /// Base58 fee payer signature, which is also the transaction id
    pub signature: String,
    /// Co-signed transaction, ready to broadcast
    pub transaction: EncodedTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapToNativeRequest {
    pub user: String,
    pub source_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
}

/// Token fee charged on top of a swap, paid from the user's token account.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapFeeOptions {
    /// Fee in the token's smallest unit; negative values are rejected
    pub amount: i64,
    pub source_account: Pubkey,
    pub destination_account: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapToNativeResponse {
    pub transaction: EncodedTransaction,
    pub quote: SwapQuote,
    pub message_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignGeneratedTransactionRequest {
    pub transaction: EncodedTransaction,
    pub message_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub transaction: EncodedTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionResponse {
    /// Base58 signature of the confirmed transaction
    pub signature: String,
}
