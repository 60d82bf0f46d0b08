//! Validation of the fee transfer carried in a transaction's first instruction.
use log::warn;
use solana_sdk::{program_pack::Pack, transaction::Transaction};
use spl_token::state::Account as TokenAccount;

use super::{decode_transfer, decompile_instruction, RelayError};
use crate::{
    models::{DecodedTransfer, FeeTable, TokenFee, TransferKind},
    services::SolanaProviderTrait,
};

pub struct TransferValidator {}

impl TransferValidator {
    /// Checks that the first instruction pays the configured fee to the fee
    /// account for the source token's mint, authorised by the user in
    /// signature slot 1.
    ///
    /// Returns the decoded transfer and the matching fee table entry.
    pub async fn validate<P: SolanaProviderTrait + ?Sized>(
        tx: &Transaction,
        fee_table: &FeeTable,
        provider: &P,
    ) -> Result<(DecodedTransfer, TokenFee), RelayError> {
        let compiled = tx.message.instructions.first().ok_or_else(|| {
            RelayError::InvalidInstruction("Transaction has no instructions".to_string())
        })?;
        let instruction = decompile_instruction(tx, compiled)?;
        let transfer = decode_transfer(&instruction)?;

        let source_account = provider
            .get_account_from_pubkey(transfer.source_pubkey())
            .await?;
        if source_account.owner != spl_token::id() {
            return Err(RelayError::InvalidInstruction(format!(
                "Source {} is not a token account",
                transfer.source_pubkey()
            )));
        }
        let token_account = TokenAccount::unpack(&source_account.data).map_err(|e| {
            RelayError::InvalidInstruction(format!("Invalid source token account: {e}"))
        })?;

        if token_account.owner != transfer.owner.pubkey {
            return Err(RelayError::InvalidSourceOwner);
        }
        if token_account.is_frozen() {
            return Err(RelayError::SourceFrozen);
        }
        if token_account.amount < transfer.amount {
            return Err(RelayError::InsufficientBalance {
                balance: token_account.amount,
                amount: transfer.amount,
            });
        }

        let token_fee = fee_table
            .find_by_mint(&token_account.mint)
            .cloned()
            .ok_or_else(|| RelayError::UnsupportedToken(token_account.mint.to_string()))?;

        if transfer.amount < token_fee.fee {
            warn!(
                "Fee transfer of {} from {} is below the minimum {}",
                transfer.amount,
                transfer.source_pubkey(),
                token_fee.fee
            );
            return Err(RelayError::AmountTooLow {
                amount: transfer.amount,
                minimum: token_fee.fee,
            });
        }

        Self::validate_flags(tx, &transfer, &token_fee)?;

        Ok((transfer, token_fee))
    }

    /// Signer and writable flags plus the destination and owner binding.
    pub fn validate_flags(
        tx: &Transaction,
        transfer: &DecodedTransfer,
        token_fee: &TokenFee,
    ) -> Result<(), RelayError> {
        if !transfer.source.is_writable || transfer.source.is_signer {
            return Err(RelayError::InvalidAccountFlags(format!(
                "source {} must be writable and not a signer",
                transfer.source.pubkey
            )));
        }

        if transfer.destination.pubkey != token_fee.account {
            return Err(RelayError::InvalidDestination(format!(
                "expected {}, got {}",
                token_fee.account, transfer.destination.pubkey
            )));
        }
        if !transfer.destination.is_writable || transfer.destination.is_signer {
            return Err(RelayError::InvalidDestination(format!(
                "{} must be writable and not a signer",
                transfer.destination.pubkey
            )));
        }

        // The transfer authority must be the user who signed slot 1
        let user = if tx.message.header.num_required_signatures >= 2 {
            tx.message.account_keys.get(1)
        } else {
            None
        };
        if user != Some(&transfer.owner.pubkey) {
            return Err(RelayError::OwnerNotSigner(format!(
                "owner {} does not hold signature slot 1",
                transfer.owner.pubkey
            )));
        }
        if transfer.owner.is_writable || !transfer.owner.is_signer {
            return Err(RelayError::OwnerNotSigner(format!(
                "owner {} must be a read-only signer",
                transfer.owner.pubkey
            )));
        }

        if let TransferKind::Checked { mint, decimals } = &transfer.kind {
            if *decimals != token_fee.decimals {
                return Err(RelayError::InvalidDecimals {
                    expected: token_fee.decimals,
                    actual: *decimals,
                });
            }
            if mint.pubkey != token_fee.mint || mint.is_writable || mint.is_signer {
                return Err(RelayError::InvalidMint(mint.pubkey.to_string()));
            }
        }

        Ok(())
    }
}
