use serde::Serialize;
use thiserror::Error;

use crate::{
    models::TransactionEncodingError,
    services::{CacheError, SignerError, SolanaProviderError, SwapError},
};

/// Every way a relay request can be rejected.
///
/// All variants are terminal for the request; nothing is retried internally.
#[derive(Debug, Error, Serialize)]
pub enum RelayError {
    // Structural
    #[error("Invalid fee payer")]
    InvalidFeePayer,
    #[error("Missing recent blockhash")]
    MissingBlockhash,
    #[error("Blockhash not found")]
    BlockhashNotFound,
    #[error("Fee too high: {lamports_per_signature} lamports per signature (max {max})")]
    FeeTooHigh {
        lamports_per_signature: u64,
        max: u64,
    },
    #[error("No signatures")]
    NoSignatures,
    #[error("Too many signatures: {count} (max {max})")]
    TooManySignatures { count: usize, max: usize },
    #[error("Invalid fee payer signature slot: {0}")]
    InvalidFeePayerSlot(String),
    #[error("Missing signature: {0}")]
    MissingSignature(String),
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),
    #[error("Failed to decode transaction: {0}")]
    TransactionDecode(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Economic
    #[error("Source account has insufficient balance: {balance} < {amount}")]
    InsufficientBalance { balance: u64, amount: u64 },
    #[error("Token {0} is not accepted for fees")]
    UnsupportedToken(String),
    #[error("Fee amount {amount} is below the minimum of {minimum}")]
    AmountTooLow { amount: u64, minimum: u64 },
    #[error("Amount can't be zero")]
    InvalidAmount,
    #[error("Fee can't be less than zero: {0}")]
    InvalidFee(i64),
    #[error("Source mint {0} isn't supported for swaps")]
    UnsupportedSwapMint(String),
    #[error("Invalid token fee pricing: {0}")]
    InvalidFeePricing(String),

    // Security
    #[error("Potential drain: fee payer is writable or signer in instruction {0}")]
    PotentialDrain(usize),
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
    #[error("Source account owner does not match the transfer owner")]
    InvalidSourceOwner,
    #[error("Source account is frozen")]
    SourceFrozen,
    #[error("Invalid account flags: {0}")]
    InvalidAccountFlags(String),
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    #[error("Owner is not a valid signer: {0}")]
    OwnerNotSigner(String),
    #[error("Invalid decimals: expected {expected}, got {actual}")]
    InvalidDecimals { expected: u8, actual: u8 },
    #[error("Invalid mint: {0}")]
    InvalidMint(String),
    #[error("Transaction should contain 2 instructions (fee payment, account init), got {0}")]
    WrongInstructionCount(usize),
    #[error("Account instruction should call the associated token program, got {0}")]
    WrongProgram(String),
    #[error("Account {0} already exists")]
    AccountAlreadyExists(String),
    #[error("Unable to match associated account instruction")]
    InstructionMismatch,
    #[error("Wrong network: {0}")]
    WrongNetwork(String),
    #[error("Associated native account {0} already exists for user")]
    NativeAccountExists(String),
    #[error("Message token isn't valid")]
    InvalidMessageToken,
    #[error("Transaction should have at least 2 pubkeys as signers")]
    NotEnoughSigners,

    // Concurrency
    #[error("Duplicate transaction")]
    DuplicateTransaction,
    #[error("Duplicate transfer from source {0}")]
    DuplicateTransfer(String),
    #[error("Duplicate account request for {0} within the same recent blockhash")]
    DuplicateAccountRequest(String),
    #[error("Duplicate signature request")]
    DuplicateSignatureRequest,
    #[error("Too many requests for same user and mint")]
    TooManyRequests,

    // Simulation
    #[error("Simulation error: {0}")]
    SimulationFailed(String),

    // Collaborators
    #[error("Provider error: {0}")]
    Provider(#[from] SolanaProviderError),
    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Swap provider error: {0}")]
    Swap(#[from] SwapError),
}

impl RelayError {
    /// Stable identifier for the rejection, suitable for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidFeePayer => "invalid_fee_payer",
            RelayError::MissingBlockhash => "missing_blockhash",
            RelayError::BlockhashNotFound => "blockhash_not_found",
            RelayError::FeeTooHigh { .. } => "fee_too_high",
            RelayError::NoSignatures => "no_signatures",
            RelayError::TooManySignatures { .. } => "too_many_signatures",
            RelayError::InvalidFeePayerSlot(_) => "invalid_fee_payer_slot",
            RelayError::MissingSignature(_) => "missing_signature",
            RelayError::SignatureVerification(_) => "signature_verification",
            RelayError::TransactionDecode(_) => "transaction_decode",
            RelayError::InvalidAddress(_) => "invalid_address",
            RelayError::InsufficientBalance { .. } => "insufficient_balance",
            RelayError::UnsupportedToken(_) => "unsupported_token",
            RelayError::AmountTooLow { .. } => "amount_too_low",
            RelayError::InvalidAmount => "invalid_amount",
            RelayError::InvalidFee(_) => "invalid_fee",
            RelayError::UnsupportedSwapMint(_) => "unsupported_swap_mint",
            RelayError::InvalidFeePricing(_) => "invalid_fee_pricing",
            RelayError::PotentialDrain(_) => "potential_drain",
            RelayError::InvalidInstruction(_) => "invalid_instruction",
            RelayError::InvalidSourceOwner => "invalid_source_owner",
            RelayError::SourceFrozen => "source_frozen",
            RelayError::InvalidAccountFlags(_) => "invalid_account_flags",
            RelayError::InvalidDestination(_) => "invalid_destination",
            RelayError::OwnerNotSigner(_) => "owner_not_signer",
            RelayError::InvalidDecimals { .. } => "invalid_decimals",
            RelayError::InvalidMint(_) => "invalid_mint",
            RelayError::WrongInstructionCount(_) => "wrong_instruction_count",
            RelayError::WrongProgram(_) => "wrong_program",
            RelayError::AccountAlreadyExists(_) => "account_already_exists",
            RelayError::InstructionMismatch => "instruction_mismatch",
            RelayError::WrongNetwork(_) => "wrong_network",
            RelayError::NativeAccountExists(_) => "native_account_exists",
            RelayError::InvalidMessageToken => "invalid_message_token",
            RelayError::NotEnoughSigners => "not_enough_signers",
            RelayError::DuplicateTransaction => "duplicate_transaction",
            RelayError::DuplicateTransfer(_) => "duplicate_transfer",
            RelayError::DuplicateAccountRequest(_) => "duplicate_account_request",
            RelayError::DuplicateSignatureRequest => "duplicate_signature_request",
            RelayError::TooManyRequests => "too_many_requests",
            RelayError::SimulationFailed(_) => "simulation_failed",
            RelayError::Provider(_) => "provider_error",
            RelayError::Signer(_) => "signer_error",
            RelayError::Cache(_) => "cache_error",
            RelayError::Swap(_) => "swap_error",
        }
    }

    /// Whether the rejection was caused by a cross-request throttle or lock.
    pub fn is_concurrency_error(&self) -> bool {
        matches!(
            self,
            RelayError::DuplicateTransaction
                | RelayError::DuplicateTransfer(_)
                | RelayError::DuplicateAccountRequest(_)
                | RelayError::DuplicateSignatureRequest
                | RelayError::TooManyRequests
        )
    }
}

impl From<TransactionEncodingError> for RelayError {
    fn from(error: TransactionEncodingError) -> Self {
        RelayError::TransactionDecode(error.to_string())
    }
}
