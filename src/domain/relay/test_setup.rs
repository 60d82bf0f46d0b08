//! Shared fixtures for relay tests
use solana_sdk::{
    account::Account,
    hash::Hash,
    instruction::Instruction,
    message::Message,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::state::{Account as TokenAccount, AccountState};
use std::time::Duration;

use crate::{
    models::{FeeTable, LockoutPolicy, RelayPolicy, TokenFee},
    services::{LocalSigner, MockSolanaProviderTrait, SimulationOutcome},
};

pub const TEST_DECIMALS: u8 = 9;
pub const TEST_MIN_FEE: u64 = 100;
pub const TEST_LAMPORTS_PER_SIGNATURE: u64 = 5000;

/// A fee payer, a user holding `mint` in `source`, and a fee table that
/// accepts `mint` into `fee_account`.
pub struct TransferTestContext {
    pub fee_payer: Keypair,
    pub user: Keypair,
    pub mint: Pubkey,
    pub source: Pubkey,
    pub fee_account: Pubkey,
    pub fee_table: FeeTable,
}

impl TransferTestContext {
    pub fn new() -> Self {
        let fee_payer = Keypair::new();
        let user = Keypair::new();
        let mint = Pubkey::new_unique();
        let source = get_associated_token_address(&user.pubkey(), &mint);
        let fee_account = get_associated_token_address(&fee_payer.pubkey(), &mint);
        let fee_table = FeeTable::new(vec![TokenFee::new(
            mint,
            fee_account,
            TEST_DECIMALS,
            TEST_MIN_FEE,
        )]);

        Self {
            fee_payer,
            user,
            mint,
            source,
            fee_account,
            fee_table,
        }
    }

    pub fn signer(&self) -> LocalSigner {
        LocalSigner::new(self.fee_payer.insecure_clone())
    }

    /// Policy accepting the context's mint for every action.
    pub fn policy(&self) -> RelayPolicy {
        RelayPolicy {
            max_signatures: 2,
            lamports_per_signature: TEST_LAMPORTS_PER_SIGNATURE,
            same_source_timeout: Duration::from_secs(5),
            same_mint_timeout: Duration::from_secs(3),
            lockout_policy: LockoutPolicy::HardLockout,
            cache_ttl: Duration::from_secs(60),
            require_mainnet_for_swap: true,
            transfer_fees: self.fee_table.clone(),
            create_account_fees: self.fee_table.clone(),
            swap_fees: self.fee_table.clone(),
        }
    }

    pub fn fee_transfer_instruction(&self, amount: u64) -> Instruction {
        spl_token::instruction::transfer(
            &spl_token::id(),
            &self.source,
            &self.fee_account,
            &self.user.pubkey(),
            &[],
            amount,
        )
        .unwrap()
    }

    pub fn checked_fee_transfer_instruction(
        &self,
        amount: u64,
        mint: Pubkey,
        decimals: u8,
    ) -> Instruction {
        spl_token::instruction::transfer_checked(
            &spl_token::id(),
            &self.source,
            &mint,
            &self.fee_account,
            &self.user.pubkey(),
            &[],
            amount,
            decimals,
        )
        .unwrap()
    }

    /// Builds a transaction paid by the fee payer and signed by the user only.
    pub fn signed_transaction(&self, instructions: &[Instruction]) -> Transaction {
        let message = Message::new_with_blockhash(
            instructions,
            Some(&self.fee_payer.pubkey()),
            &Hash::new_unique(),
        );
        let mut tx = Transaction::new_unsigned(message);
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[&self.user], blockhash);
        tx
    }

    pub fn transfer_transaction(&self, amount: u64) -> Transaction {
        self.signed_transaction(&[self.fee_transfer_instruction(amount)])
    }

    /// Fee transfer followed by creation of `owner`'s account for the mint,
    /// funded by the fee payer.
    pub fn create_account_transaction(&self, amount: u64, owner: &Pubkey) -> Transaction {
        let create = create_associated_token_account(
            &self.fee_payer.pubkey(),
            owner,
            &self.mint,
            &spl_token::id(),
        );
        self.signed_transaction(&[self.fee_transfer_instruction(amount), create])
    }

    pub fn source_state(&self, amount: u64) -> TokenAccount {
        TokenAccount {
            mint: self.mint,
            owner: self.user.pubkey(),
            amount,
            state: AccountState::Initialized,
            ..Default::default()
        }
    }

    /// Provider that accepts any blockhash at the test fee, serves the source
    /// account and reports successful simulations.
    pub fn transfer_provider(&self, source_amount: u64) -> MockSolanaProviderTrait {
        let mut provider = MockSolanaProviderTrait::new();
        provider
            .expect_get_fee_for_blockhash()
            .returning(|_| Box::pin(async { Ok(Some(TEST_LAMPORTS_PER_SIGNATURE)) }));

        let data = token_account_data(self.source_state(source_amount));
        provider
            .expect_get_account_from_pubkey()
            .returning(move |_| {
                let account = spl_account(data.clone());
                Box::pin(async move { Ok(account) })
            });
        provider
            .expect_simulate_transaction()
            .returning(|_| Box::pin(async { Ok(SimulationOutcome::default()) }));
        provider
    }
}

pub fn token_account_data(account: TokenAccount) -> Vec<u8> {
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(account, &mut data).unwrap();
    data
}

pub fn spl_account(data: Vec<u8>) -> Account {
    Account {
        lamports: 2_039_280,
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}
