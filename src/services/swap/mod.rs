//! Swap capability used by the swap-to-native action.
//!
//! Pool discovery, pricing and instruction building for a concrete protocol
//! live behind [`SwapProviderTrait`]; the relay only asks for a quote and for
//! the instructions that execute it.
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use thiserror::Error;

#[derive(Error, Debug, Serialize)]
pub enum SwapError {
    #[error("No pool found for {input_mint} -> {output_mint}")]
    PoolNotFound {
        input_mint: String,
        output_mint: String,
    },

    #[error("Failed to get swap quote: {0}")]
    QuoteFailed(String),

    #[error("Failed to build swap instructions: {0}")]
    InstructionBuild(String),
}

/// Priced swap returned by the pool integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Minimum output after slippage
    pub other_amount_threshold: u64,
    pub slippage_bps: u16,
    pub pool_address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuoteParams {
    pub user: Pubkey,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    pub slippage_bps: u16,
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait SwapProviderTrait: Send + Sync {
    /// Purpose tag for message tokens issued over this provider's swaps.
    fn message_token_key(&self) -> String;

    async fn get_quote(&self, params: SwapQuoteParams) -> Result<SwapQuote, SwapError>;

    /// Instructions that perform `quote` for `user`. The output must land in
    /// the user's wrapped-native associated token account.
    async fn get_swap_instructions(
        &self,
        user: &Pubkey,
        quote: &SwapQuote,
    ) -> Result<Vec<Instruction>, SwapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_quote_serializes_camel_case() {
        let quote = SwapQuote {
            input_mint: "in".to_string(),
            output_mint: "out".to_string(),
            in_amount: 10,
            out_amount: 9,
            other_amount_threshold: 8,
            slippage_bps: 50,
            pool_address: "pool".to_string(),
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["otherAmountThreshold"], 8);
        assert_eq!(json["slippageBps"], 50);
    }
}
