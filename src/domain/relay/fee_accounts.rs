//! Fee table bootstrap helpers: token fee pricing and creation of the fee
//! payer's token accounts.
use log::{info, warn};
use serde::Serialize;
use solana_sdk::{
    message::Message, native_token::LAMPORTS_PER_SOL, pubkey::Pubkey, signature::Keypair,
    signer::Signer, transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};

use super::RelayError;
use crate::{
    models::TokenFee,
    services::{sign_sdk_transaction, SolanaProviderTrait, SolanaSignTrait},
};

/// Prices a token fee that covers `cost_in_lamports` with the given margin.
///
/// `price` is the number of whole tokens one SOL buys. `margin` must be in
/// `[0, 1)`: a margin of 0.9 charges ten times the cost.
pub fn create_token_fee(
    mint: Pubkey,
    account: Pubkey,
    price: f64,
    cost_in_lamports: u64,
    margin: f64,
    decimals: u8,
) -> Result<TokenFee, RelayError> {
    if !price.is_finite() || price < 0.0 {
        return Err(RelayError::InvalidFeePricing(format!("price {}", price)));
    }
    if !(0.0..1.0).contains(&margin) {
        return Err(RelayError::InvalidFeePricing(format!(
            "margin {} is outside [0, 1)",
            margin
        )));
    }

    let price_per_cost = price / LAMPORTS_PER_SOL as f64 * cost_in_lamports as f64;
    let price_after_margin = price_per_cost * (1.0 / (1.0 - margin));
    let base_units = (price_after_margin * 10f64.powi(decimals as i32)).floor();
    let fee = (base_units as u64).checked_add(1).ok_or_else(|| {
        RelayError::InvalidFeePricing(format!("fee {} overflows u64", base_units))
    })?;

    Ok(TokenFee::new(mint, account, decimals, fee))
}

/// Current network fee for a message with a single signature.
pub async fn get_lamports_per_signature<P: SolanaProviderTrait + ?Sized>(
    provider: &P,
) -> Result<u64, RelayError> {
    let blockhash = provider.get_latest_blockhash().await?;
    let payer = Keypair::new().pubkey();
    let message = Message::new_with_blockhash(&[], Some(&payer), &blockhash);
    Ok(provider.get_fee_for_message(&message).await?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccount {
    pub address: Pubkey,
    pub mint: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccountResult {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub error: Option<String>,
}

impl CreateAccountResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Lists fee accounts that are missing on-chain and can be created by the
/// fee payer, i.e. its own associated account for the mint.
pub async fn build_create_account_list<'a, P, I>(
    provider: &P,
    fee_payer: &Pubkey,
    token_fees: I,
) -> Result<Vec<CreateAccount>, RelayError>
where
    P: SolanaProviderTrait + ?Sized,
    I: IntoIterator<Item = &'a TokenFee>,
{
    let mut accounts: Vec<CreateAccount> = Vec::new();
    for token_fee in token_fees {
        if accounts.iter().any(|a| a.address == token_fee.account) {
            continue;
        }
        if get_associated_token_address(fee_payer, &token_fee.mint) != token_fee.account {
            warn!(
                "Fee account {} for mint {} is not owned by the fee payer, skipping",
                token_fee.account, token_fee.mint
            );
            continue;
        }
        if provider
            .get_account_if_exists(&token_fee.account)
            .await?
            .is_some()
        {
            continue;
        }

        accounts.push(CreateAccount {
            address: token_fee.account,
            mint: token_fee.mint,
        });
    }

    Ok(accounts)
}

async fn create_fee_account<P, S>(provider: &P, signer: &S, mint: &Pubkey) -> Result<(), RelayError>
where
    P: SolanaProviderTrait + ?Sized,
    S: SolanaSignTrait + ?Sized,
{
    let fee_payer = signer.pubkey();
    let instruction =
        create_associated_token_account(&fee_payer, &fee_payer, mint, &spl_token::id());
    let blockhash = provider.get_latest_blockhash().await?;
    let message = Message::new_with_blockhash(&[instruction], Some(&fee_payer), &blockhash);
    let mut tx = Transaction::new_unsigned(message);
    sign_sdk_transaction(signer, &mut tx).await?;
    let signature = provider.send_and_confirm_transaction(&tx).await?;
    info!("Created fee account for mint {} ({})", mint, signature);
    Ok(())
}

/// Creates each account in turn. A failure is recorded on its result and
/// does not stop the remaining accounts.
pub async fn create_fee_accounts<P, S>(
    provider: &P,
    signer: &S,
    accounts: &[CreateAccount],
) -> Vec<CreateAccountResult>
where
    P: SolanaProviderTrait + ?Sized,
    S: SolanaSignTrait + ?Sized,
{
    let mut results = Vec::with_capacity(accounts.len());
    for account in accounts {
        let error = match create_fee_account(provider, signer, &account.mint).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to create fee account {}: {}", account.address, e);
                Some(e.to_string())
            }
        };
        results.push(CreateAccountResult {
            address: account.address,
            mint: account.mint,
            error,
        });
    }
    results
}
