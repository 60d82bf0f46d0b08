use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

/// Variant-specific part of a decoded SPL token transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferKind {
    Unchecked,
    Checked { mint: AccountMeta, decimals: u8 },
}

/// SPL token `Transfer` or `TransferChecked` decoded from a raw instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTransfer {
    pub source: AccountMeta,
    pub destination: AccountMeta,
    pub owner: AccountMeta,
    pub amount: u64,
    pub kind: TransferKind,
}

impl DecodedTransfer {
    pub fn source_pubkey(&self) -> &Pubkey {
        &self.source.pubkey
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.kind, TransferKind::Checked { .. })
    }
}
