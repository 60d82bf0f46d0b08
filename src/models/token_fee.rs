//! Fee table model: which tokens are accepted as fee payment, where the fee
//! must be sent, and the minimum amount.
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum TokenFeeError {
    #[error("Invalid {field} address: {value}")]
    InvalidAddress { field: String, value: String },
}

/// Wire/config representation of a [`TokenFee`], with base58 addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableTokenFee {
    pub mint: String,
    pub account: String,
    pub decimals: u8,
    pub fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SerializableTokenFee", into = "SerializableTokenFee")]
pub struct TokenFee {
    pub mint: Pubkey,
    /// Token account that receives the fee
    pub account: Pubkey,
    pub decimals: u8,
    /// Minimum fee in the token's smallest unit
    pub fee: u64,
}

impl TokenFee {
    pub fn new(mint: Pubkey, account: Pubkey, decimals: u8, fee: u64) -> Self {
        Self {
            mint,
            account,
            decimals,
            fee,
        }
    }
}

fn parse_address(field: &str, value: &str) -> Result<Pubkey, TokenFeeError> {
    Pubkey::from_str(value).map_err(|_| TokenFeeError::InvalidAddress {
        field: field.to_string(),
        value: value.to_string(),
    })
}

impl TryFrom<SerializableTokenFee> for TokenFee {
    type Error = TokenFeeError;

    fn try_from(value: SerializableTokenFee) -> Result<Self, Self::Error> {
        Ok(Self {
            mint: parse_address("mint", &value.mint)?,
            account: parse_address("account", &value.account)?,
            decimals: value.decimals,
            fee: value.fee,
        })
    }
}

impl From<TokenFee> for SerializableTokenFee {
    fn from(value: TokenFee) -> Self {
        Self {
            mint: value.mint.to_string(),
            account: value.account.to_string(),
            decimals: value.decimals,
            fee: value.fee,
        }
    }
}

/// Accepted fee tokens for one action, looked up by mint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeTable {
    tokens: Vec<TokenFee>,
}

impl FeeTable {
    pub fn new(tokens: Vec<TokenFee>) -> Self {
        Self { tokens }
    }

    pub fn find_by_mint(&self, mint: &Pubkey) -> Option<&TokenFee> {
        self.tokens.iter().find(|token| token.mint == *mint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenFee> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<Vec<TokenFee>> for FeeTable {
    fn from(tokens: Vec<TokenFee>) -> Self {
        Self::new(tokens)
    }
}
