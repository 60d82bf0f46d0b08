//! Validation of fee-payer funded associated token account creation.
use log::warn;
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use std::time::Duration;

use super::{
    acquire_account_request_lock, are_instructions_equal, decompile_instructions, RelayError,
};
use crate::services::{CacheStore, SolanaProviderTrait};

pub struct AccountInitValidator {}

impl AccountInitValidator {
    /// Checks that `tx` is exactly `[fee transfer, create associated token
    /// account]` with the fee payer funding the new account, and claims the
    /// account for the transaction's blockhash.
    ///
    /// The fee transfer itself is validated separately. Returns the address of
    /// the account to be created.
    pub async fn validate<P, C>(
        tx: &Transaction,
        fee_payer: &Pubkey,
        provider: &P,
        cache: &C,
        lock_ttl: Duration,
    ) -> Result<Pubkey, RelayError>
    where
        P: SolanaProviderTrait + ?Sized,
        C: CacheStore + ?Sized,
    {
        // Work on a private copy decoded from wire bytes
        let bytes = bincode::serialize(tx)
            .map_err(|e| RelayError::TransactionDecode(e.to_string()))?;
        let tx: Transaction = bincode::deserialize(&bytes)
            .map_err(|e| RelayError::TransactionDecode(e.to_string()))?;

        let instructions = decompile_instructions(&tx)?;
        if instructions.len() != 2 {
            return Err(RelayError::WrongInstructionCount(instructions.len()));
        }
        let instruction = &instructions[1];

        if instruction.program_id != spl_associated_token_account::id() {
            return Err(RelayError::WrongProgram(instruction.program_id.to_string()));
        }

        if instruction.accounts.len() < 4 {
            return Err(RelayError::InstructionMismatch);
        }
        let owner = instruction.accounts[2].pubkey;
        let mint = instruction.accounts[3].pubkey;
        let associated_account = get_associated_token_address(&owner, &mint);

        if provider
            .get_account_if_exists(&associated_account)
            .await?
            .is_some()
        {
            return Err(RelayError::AccountAlreadyExists(
                associated_account.to_string(),
            ));
        }

        let reference =
            create_associated_token_account(fee_payer, &owner, &mint, &spl_token::id());
        if !are_instructions_equal(&reference, instruction) {
            warn!(
                "Account instruction for {} does not match the reference instruction",
                associated_account
            );
            return Err(RelayError::InstructionMismatch);
        }

        acquire_account_request_lock(
            cache,
            &tx.message.recent_blockhash,
            &associated_account,
            lock_ttl,
        )
        .await?;

        Ok(associated_account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::relay::test_setup::*,
        services::{InMemoryCache, MockSolanaProviderTrait},
    };
    use solana_sdk::{instruction::AccountMeta, signer::Signer};

    fn provider_without_account() -> MockSolanaProviderTrait {
        let mut provider = MockSolanaProviderTrait::new();
        provider
            .expect_get_account_if_exists()
            .returning(|_| Box::pin(async { Ok(None) }));
        provider
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_accepts_reference_instruction() {
        let ctx = TransferTestContext::new();
        let target_owner = Pubkey::new_unique();
        let tx = ctx.create_account_transaction(100, &target_owner);
        let cache = InMemoryCache::new(10);

        let account = AccountInitValidator::validate(
            &tx,
            &ctx.fee_payer.pubkey(),
            &provider_without_account(),
            &cache,
            TTL,
        )
        .await
        .unwrap();

        assert_eq!(account, get_associated_token_address(&target_owner, &ctx.mint));
    }

    #[tokio::test]
    async fn test_rejects_duplicate_request_within_blockhash() {
        let ctx = TransferTestContext::new();
        let tx = ctx.create_account_transaction(100, &Pubkey::new_unique());
        let cache = InMemoryCache::new(10);
        let provider = provider_without_account();
        let fee_payer = ctx.fee_payer.pubkey();

        AccountInitValidator::validate(&tx, &fee_payer, &provider, &cache, TTL)
            .await
            .unwrap();
        assert!(matches!(
            AccountInitValidator::validate(&tx, &fee_payer, &provider, &cache, TTL).await,
            Err(RelayError::DuplicateAccountRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_existing_account() {
        let ctx = TransferTestContext::new();
        let tx = ctx.create_account_transaction(100, &Pubkey::new_unique());

        let mut provider = MockSolanaProviderTrait::new();
        provider.expect_get_account_if_exists().returning(|_| {
            Box::pin(async { Ok(Some(spl_account(vec![0; 165]))) })
        });

        assert!(matches!(
            AccountInitValidator::validate(
                &tx,
                &ctx.fee_payer.pubkey(),
                &provider,
                &InMemoryCache::new(10),
                TTL
            )
            .await,
            Err(RelayError::AccountAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_wrong_instruction_count() {
        let ctx = TransferTestContext::new();
        let tx = ctx.transfer_transaction(100);

        assert!(matches!(
            AccountInitValidator::validate(
                &tx,
                &ctx.fee_payer.pubkey(),
                &MockSolanaProviderTrait::new(),
                &InMemoryCache::new(10),
                TTL
            )
            .await,
            Err(RelayError::WrongInstructionCount(1))
        ));
    }

    #[tokio::test]
    async fn test_rejects_wrong_program() {
        let ctx = TransferTestContext::new();
        let tx = ctx.signed_transaction(&[
            ctx.fee_transfer_instruction(100),
            ctx.fee_transfer_instruction(100),
        ]);

        assert!(matches!(
            AccountInitValidator::validate(
                &tx,
                &ctx.fee_payer.pubkey(),
                &MockSolanaProviderTrait::new(),
                &InMemoryCache::new(10),
                TTL
            )
            .await,
            Err(RelayError::WrongProgram(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_tampered_instruction() {
        let ctx = TransferTestContext::new();
        let target_owner = Pubkey::new_unique();
        let mut create = create_associated_token_account(
            &ctx.fee_payer.pubkey(),
            &target_owner,
            &ctx.mint,
            &spl_token::id(),
        );
        // Point the new account somewhere other than the derived address
        create.accounts[1] = AccountMeta::new(Pubkey::new_unique(), false);
        let tx = ctx.signed_transaction(&[ctx.fee_transfer_instruction(100), create]);

        assert!(matches!(
            AccountInitValidator::validate(
                &tx,
                &ctx.fee_payer.pubkey(),
                &provider_without_account(),
                &InMemoryCache::new(10),
                TTL
            )
            .await,
            Err(RelayError::InstructionMismatch)
        ));
    }

    #[tokio::test]
    async fn test_rejects_account_funded_by_someone_else() {
        let ctx = TransferTestContext::new();
        let funder = solana_sdk::signature::Keypair::new();
        let create = create_associated_token_account(
            &funder.pubkey(),
            &Pubkey::new_unique(),
            &ctx.mint,
            &spl_token::id(),
        );
        let message = solana_sdk::message::Message::new_with_blockhash(
            &[ctx.fee_transfer_instruction(100), create],
            Some(&ctx.fee_payer.pubkey()),
            &solana_sdk::hash::Hash::new_unique(),
        );
        let mut tx = Transaction::new_unsigned(message);
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[&ctx.user, &funder], blockhash);

        assert!(matches!(
            AccountInitValidator::validate(
                &tx,
                &ctx.fee_payer.pubkey(),
                &provider_without_account(),
                &InMemoryCache::new(10),
                TTL
            )
            .await,
            Err(RelayError::InstructionMismatch)
        ));
    }
}
