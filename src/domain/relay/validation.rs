//! Structural checks on incoming transactions and the fee payer drain guard.
//!
//! These run before anything touches account state:
//! * The fee payer is the relay's key and its signature slot is still empty
//! * The blockhash is known to the node and quotes an acceptable fee
//! * Signature slots are within limits and every user slot is signed
//! * No instruction can debit or sign as the fee payer
use log::warn;
use solana_sdk::{
    hash::Hash, instruction::Instruction, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

use super::RelayError;
use crate::{models::RelayPolicy, services::SolanaProviderTrait};

pub struct TransactionValidator {}

impl TransactionValidator {
    /// Runs every structural check in order, stopping at the first failure.
    pub async fn validate_structure<P: SolanaProviderTrait + ?Sized>(
        tx: &Transaction,
        fee_payer: &Pubkey,
        policy: &RelayPolicy,
        provider: &P,
    ) -> Result<(), RelayError> {
        Self::validate_fee_payer(tx, fee_payer)?;
        Self::validate_blockhash_present(tx)?;
        Self::validate_blockhash_fee(tx, policy.lamports_per_signature, provider).await?;
        Self::validate_signature_count(tx, policy.max_signatures)?;
        Self::validate_fee_payer_slot(tx, fee_payer)?;
        Self::validate_user_signatures(tx)?;
        Ok(())
    }

    /// Validates that the transaction's fee payer is the relay's key.
    pub fn validate_fee_payer(tx: &Transaction, fee_payer: &Pubkey) -> Result<(), RelayError> {
        match tx.message.account_keys.first() {
            Some(key) if key == fee_payer => Ok(()),
            other => {
                warn!(
                    "Rejecting transaction with fee payer {:?}, expected {}",
                    other, fee_payer
                );
                Err(RelayError::InvalidFeePayer)
            }
        }
    }

    pub fn validate_blockhash_present(tx: &Transaction) -> Result<(), RelayError> {
        if tx.message.recent_blockhash == Hash::default() {
            return Err(RelayError::MissingBlockhash);
        }
        Ok(())
    }

    /// Checks that the node still knows the blockhash and that its
    /// per-signature fee is within `max_lamports_per_signature`.
    pub async fn validate_blockhash_fee<P: SolanaProviderTrait + ?Sized>(
        tx: &Transaction,
        max_lamports_per_signature: u64,
        provider: &P,
    ) -> Result<(), RelayError> {
        let blockhash = tx.message.recent_blockhash;
        let lamports_per_signature = provider
            .get_fee_for_blockhash(&blockhash)
            .await?
            .ok_or(RelayError::BlockhashNotFound)?;

        if lamports_per_signature > max_lamports_per_signature {
            return Err(RelayError::FeeTooHigh {
                lamports_per_signature,
                max: max_lamports_per_signature,
            });
        }
        Ok(())
    }

    pub fn validate_signature_count(
        tx: &Transaction,
        max_signatures: usize,
    ) -> Result<(), RelayError> {
        let count = tx.signatures.len();
        if count == 0 {
            return Err(RelayError::NoSignatures);
        }
        if count > max_signatures {
            return Err(RelayError::TooManySignatures {
                count,
                max: max_signatures,
            });
        }
        Ok(())
    }

    /// Slot 0 must belong to the fee payer and be unsigned.
    pub fn validate_fee_payer_slot(tx: &Transaction, fee_payer: &Pubkey) -> Result<(), RelayError> {
        if tx.message.header.num_required_signatures == 0 {
            return Err(RelayError::InvalidFeePayerSlot(
                "fee payer is not a required signer".to_string(),
            ));
        }
        if tx.message.account_keys.first() != Some(fee_payer) {
            return Err(RelayError::InvalidFeePayerSlot(
                "slot 0 does not belong to the fee payer".to_string(),
            ));
        }
        if tx.signatures.first() != Some(&Signature::default()) {
            return Err(RelayError::InvalidFeePayerSlot(
                "fee payer slot is already signed".to_string(),
            ));
        }
        Ok(())
    }

    /// Every slot after the fee payer's must map to a required signer and
    /// carry a signature.
    pub fn validate_user_signatures(tx: &Transaction) -> Result<(), RelayError> {
        let num_required = tx.message.header.num_required_signatures as usize;
        if tx.signatures.len() != num_required {
            return Err(RelayError::MissingSignature(format!(
                "expected {} signature slots, got {}",
                num_required,
                tx.signatures.len()
            )));
        }

        for (index, signature) in tx.signatures.iter().enumerate().skip(1) {
            let pubkey = tx.message.account_keys.get(index).ok_or_else(|| {
                RelayError::MissingSignature(format!("slot {index} has no public key"))
            })?;
            if *signature == Signature::default() {
                return Err(RelayError::MissingSignature(pubkey.to_string()));
            }
        }
        Ok(())
    }

    /// Rejects any instruction that marks the fee payer writable or signer.
    pub fn validate_no_fee_payer_drain(
        instructions: &[Instruction],
        fee_payer: &Pubkey,
    ) -> Result<(), RelayError> {
        for (index, instruction) in instructions.iter().enumerate() {
            let drains = instruction
                .accounts
                .iter()
                .any(|meta| meta.pubkey == *fee_payer && (meta.is_writable || meta.is_signer));
            if drains {
                warn!(
                    "Instruction {} to program {} references the fee payer as writable or signer",
                    index, instruction.program_id
                );
                return Err(RelayError::PotentialDrain(index));
            }
        }
        Ok(())
    }
}
