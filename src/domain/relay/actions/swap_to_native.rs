//! Builds a swap of a user's tokens into native SOL, paid for by the fee
//! payer.
//!
//! The returned transaction is unsigned. The user signs it and hands it back
//! with the message token to `sign_generated_transaction`.
//!
//! Instruction layout:
//! 1. optional token fee transfer to the fee payer
//! 2. create the user's wrapped-native account, funded by the fee payer
//! 3. swap instructions from the swap provider
//! 4. close the wrapped-native account into the user's wallet
//! 5. return the account rent from the user to the fee payer
use log::{info, warn};
use solana_sdk::{
    instruction::Instruction, message::Message, program_pack::Pack, pubkey::Pubkey,
    transaction::Transaction,
};
use solana_system_interface::instruction as system_instruction;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::state::Account as TokenAccount;
use std::str::FromStr;

use super::*;
use crate::{
    domain::relay::{
        check_mint_throttle, ensure_mainnet_beta, record_mint_request, MessageToken,
    },
    models::SwapFeeOptions,
    services::SwapQuoteParams,
};

fn parse_pubkey(value: &str) -> Result<Pubkey, RelayError> {
    Pubkey::from_str(value).map_err(|_| RelayError::InvalidAddress(value.to_string()))
}

impl<P, S, C, W> RelayActionsImpl<P, S, C, W>
where
    P: SolanaProviderTrait + Send + Sync + 'static,
    S: SolanaSignTrait + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    W: SwapProviderTrait + Send + Sync + 'static,
{
    /// Resolves the swap fee from the swap fee table and builds the swap.
    pub(crate) async fn swap_to_native_request_impl(
        &self,
        request: SwapToNativeRequest,
    ) -> Result<SwapToNativeResponse, RelayError> {
        let user = parse_pubkey(&request.user)?;
        let source_mint = parse_pubkey(&request.source_mint)?;

        let token_fee = self
            .policy
            .swap_fees
            .find_by_mint(&source_mint)
            .ok_or_else(|| {
                warn!("Swap requested for unsupported mint {}", source_mint);
                RelayError::UnsupportedSwapMint(source_mint.to_string())
            })?;
        let amount =
            i64::try_from(token_fee.fee).map_err(|_| RelayError::InvalidFee(i64::MAX))?;
        let fee = SwapFeeOptions {
            amount,
            source_account: get_associated_token_address(&user, &source_mint),
            destination_account: token_fee.account,
        };

        self.swap_to_native_impl(
            &user,
            &source_mint,
            request.amount,
            request.slippage_bps,
            Some(fee),
        )
        .await
    }

    pub(crate) async fn swap_to_native_impl(
        &self,
        user: &Pubkey,
        source_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
        fee: Option<SwapFeeOptions>,
    ) -> Result<SwapToNativeResponse, RelayError> {
        info!(
            "Processing swap of {} {} to native for {}",
            amount, source_mint, user
        );

        if amount == 0 {
            return Err(RelayError::InvalidAmount);
        }
        if let Some(fee) = &fee {
            if fee.amount < 0 {
                return Err(RelayError::InvalidFee(fee.amount));
            }
        }

        if self.policy.require_mainnet_for_swap {
            ensure_mainnet_beta(
                self.provider.as_ref(),
                self.cache.as_ref(),
                self.policy.cache_ttl,
            )
            .await?;
        }

        check_mint_throttle(
            self.cache.as_ref(),
            user,
            source_mint,
            self.policy.same_mint_timeout,
        )
        .await
        .inspect_err(|_| warn!("Swap for {} / {} throttled", user, source_mint))?;

        let native_mint = spl_token::native_mint::id();
        let native_account = get_associated_token_address(user, &native_mint);
        if self
            .provider
            .get_account_if_exists(&native_account)
            .await?
            .is_some()
        {
            warn!("User {} already holds wrapped native account", user);
            return Err(RelayError::NativeAccountExists(native_account.to_string()));
        }

        let quote = self
            .swap_provider
            .get_quote(SwapQuoteParams {
                user: *user,
                input_mint: *source_mint,
                output_mint: native_mint,
                amount,
                slippage_bps,
            })
            .await?;
        let swap_instructions = self
            .swap_provider
            .get_swap_instructions(user, &quote)
            .await?;

        let rent = self
            .provider
            .get_minimum_balance_for_rent_exemption(TokenAccount::LEN)
            .await?;

        let mut instructions: Vec<Instruction> = Vec::with_capacity(swap_instructions.len() + 4);
        if let Some(fee) = &fee {
            instructions.push(
                spl_token::instruction::transfer(
                    &spl_token::id(),
                    &fee.source_account,
                    &fee.destination_account,
                    user,
                    &[],
                    fee.amount as u64,
                )
                .map_err(|e| RelayError::InvalidInstruction(e.to_string()))?,
            );
        }
        instructions.push(create_associated_token_account(
            &self.fee_payer,
            user,
            &native_mint,
            &spl_token::id(),
        ));
        instructions.extend(swap_instructions);
        instructions.push(
            spl_token::instruction::close_account(
                &spl_token::id(),
                &native_account,
                user,
                user,
                &[],
            )
            .map_err(|e| RelayError::InvalidInstruction(e.to_string()))?,
        );
        instructions.push(system_instruction::transfer(user, &self.fee_payer, rent));

        let blockhash = self.provider.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(&instructions, Some(&self.fee_payer), &blockhash);
        let transaction = Transaction::new_unsigned(message);

        let raw_transaction = bincode::serialize(&transaction)
            .map_err(|e| RelayError::TransactionDecode(e.to_string()))?;
        simulate_raw_transaction(self.provider.as_ref(), &raw_transaction).await?;

        let message_token = MessageToken::new(
            self.swap_provider.message_token_key(),
            &transaction.message,
        )
        .compile(self.signer.as_ref())
        .await?;

        record_mint_request(
            self.cache.as_ref(),
            user,
            source_mint,
            self.policy.same_mint_timeout,
        )
        .await?;

        info!(
            "Built swap of {} {} for {} (expected out {})",
            amount, source_mint, user, quote.out_amount
        );
        Ok(SwapToNativeResponse {
            transaction: EncodedTransaction::from_bytes(&raw_transaction),
            quote,
            message_token,
        })
    }
}
