//! Decoding of compiled instructions and structural instruction comparison.
use solana_sdk::{
    instruction::{AccountMeta, CompiledInstruction, Instruction},
    transaction::Transaction,
};
use spl_token::instruction::TokenInstruction;

use super::RelayError;
use crate::models::{DecodedTransfer, TransferKind};

/// Expands a compiled instruction into program id, account metas and data,
/// taking signer and writable flags from the message header.
pub fn decompile_instruction(
    tx: &Transaction,
    ix: &CompiledInstruction,
) -> Result<Instruction, RelayError> {
    let account_keys = &tx.message.account_keys;

    let program_id = *account_keys
        .get(ix.program_id_index as usize)
        .ok_or_else(|| {
            RelayError::InvalidInstruction(format!(
                "Program id index {} out of bounds",
                ix.program_id_index
            ))
        })?;

    let accounts = ix
        .accounts
        .iter()
        .map(|&i| {
            let index = i as usize;
            account_keys
                .get(index)
                .map(|pubkey| AccountMeta {
                    pubkey: *pubkey,
                    is_signer: tx.message.is_signer(index),
                    is_writable: tx.message.is_maybe_writable(index, None),
                })
                .ok_or_else(|| {
                    RelayError::InvalidInstruction(format!("Account index {index} out of bounds"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instruction {
        program_id,
        accounts,
        data: ix.data.clone(),
    })
}

pub fn decompile_instructions(tx: &Transaction) -> Result<Vec<Instruction>, RelayError> {
    tx.message
        .instructions
        .iter()
        .map(|ix| decompile_instruction(tx, ix))
        .collect()
}

/// Compares program id, data bytes and every account's identity and flags,
/// in order.
pub fn are_instructions_equal(left: &Instruction, right: &Instruction) -> bool {
    left.program_id == right.program_id
        && left.data == right.data
        && left.accounts.len() == right.accounts.len()
        && left
            .accounts
            .iter()
            .zip(right.accounts.iter())
            .all(|(a, b)| {
                a.pubkey == b.pubkey && a.is_writable == b.is_writable && a.is_signer == b.is_signer
            })
}

/// Decodes an SPL token `Transfer` or `TransferChecked` instruction.
///
/// Trailing multisig signer accounts are ignored.
pub fn decode_transfer(instruction: &Instruction) -> Result<DecodedTransfer, RelayError> {
    if instruction.program_id != spl_token::id() {
        return Err(RelayError::InvalidInstruction(format!(
            "Expected token program, got {}",
            instruction.program_id
        )));
    }

    let token_ix = TokenInstruction::unpack(&instruction.data)
        .map_err(|e| RelayError::InvalidInstruction(format!("Invalid token instruction: {e}")))?;

    let accounts = &instruction.accounts;
    match token_ix {
        TokenInstruction::Transfer { amount } => {
            if accounts.len() < 3 {
                return Err(RelayError::InvalidInstruction(format!(
                    "Transfer needs 3 accounts, got {}",
                    accounts.len()
                )));
            }
            Ok(DecodedTransfer {
                source: accounts[0].clone(),
                destination: accounts[1].clone(),
                owner: accounts[2].clone(),
                amount,
                kind: TransferKind::Unchecked,
            })
        }
        TokenInstruction::TransferChecked { amount, decimals } => {
            if accounts.len() < 4 {
                return Err(RelayError::InvalidInstruction(format!(
                    "TransferChecked needs 4 accounts, got {}",
                    accounts.len()
                )));
            }
            Ok(DecodedTransfer {
                source: accounts[0].clone(),
                destination: accounts[2].clone(),
                owner: accounts[3].clone(),
                amount,
                kind: TransferKind::Checked {
                    mint: accounts[1].clone(),
                    decimals,
                },
            })
        }
        other => Err(RelayError::InvalidInstruction(format!(
            "Expected a token transfer, got {other:?}"
        ))),
    }
}
