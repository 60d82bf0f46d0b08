use serde::{Deserialize, Serialize};
use solana_sdk::transaction::Transaction;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum TransactionEncodingError {
    #[error("Invalid base58: {0}")]
    Base58(String),
    #[error("Invalid transaction bytes: {0}")]
    Bincode(String),
}

/// Base58 wire encoding of a bincode-serialized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedTransaction(String);

impl EncodedTransaction {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionEncodingError> {
        bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| TransactionEncodingError::Base58(e.to_string()))
    }
}

impl TryFrom<&Transaction> for EncodedTransaction {
    type Error = TransactionEncodingError;

    fn try_from(transaction: &Transaction) -> Result<Self, Self::Error> {
        let bytes = bincode::serialize(transaction)
            .map_err(|e| TransactionEncodingError::Bincode(e.to_string()))?;
        Ok(Self::from_bytes(&bytes))
    }
}

impl TryFrom<&EncodedTransaction> for Transaction {
    type Error = TransactionEncodingError;

    fn try_from(encoded: &EncodedTransaction) -> Result<Self, Self::Error> {
        let bytes = encoded.to_bytes()?;
        bincode::deserialize(&bytes).map_err(|e| TransactionEncodingError::Bincode(e.to_string()))
    }
}
