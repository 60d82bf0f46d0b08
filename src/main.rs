//! Bootstrap for the relay.
//!
//! Loads configuration, checks the connected cluster and the fee payer's
//! token accounts, and optionally creates the missing ones.
//!
//! Environment variables are described in `config::ServerConfig`; logging is
//! configured through `LOG_MODE`, `LOG_LEVEL` and `LOG_FILE_PATH`.
use color_eyre::{eyre::WrapErr, Result};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::time::Duration;

use token_fee_relayer::{
    config::{load_config, ServerConfig},
    constants::DEFAULT_PROVIDER_RETRY_MAX_DELAY_MS,
    domain::{
        build_create_account_list, cached_genesis_hash, create_fee_accounts,
        get_lamports_per_signature, is_mainnet_beta,
    },
    logging::setup_logging,
    services::{LocalSigner, RetryConfig, SolanaProvider, SolanaSignTrait},
    utils::initialize_cache_storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    setup_logging().wrap_err("Failed to set up logging")?;

    let config = ServerConfig::from_env()?;
    let config_file = load_config(&config.config_file_path)
        .wrap_err_with(|| format!("Failed to load config file {}", config.config_file_path))?;
    let policy = config_file.to_relay_policy(Duration::from_secs(config.cache_ttl_seconds))?;
    info!(
        "Loaded fee tables: {} transfer, {} account creation, {} swap tokens",
        policy.transfer_fees.len(),
        policy.create_account_fees.len(),
        policy.swap_fees.len()
    );

    let retry_config = RetryConfig::new(
        config.provider_max_retries,
        config.provider_retry_base_delay_ms,
        DEFAULT_PROVIDER_RETRY_MAX_DELAY_MS,
    );
    let provider = SolanaProvider::new(&config.rpc_url, config.rpc_timeout_seconds, retry_config)?;
    let signer = LocalSigner::from_base58_secret(&config.fee_payer_secret_key)?;
    let fee_payer = signer.pubkey();
    info!("Fee payer: {}", fee_payer);

    let cache = initialize_cache_storage(&config).await?;

    let genesis_hash = cached_genesis_hash(&provider, &cache, policy.cache_ttl).await?;
    if is_mainnet_beta(&genesis_hash) {
        info!("Connected to mainnet-beta via {}", config.rpc_url);
    } else {
        info!("Connected to cluster {} via {}", genesis_hash, config.rpc_url);
        if policy.require_mainnet_for_swap && !policy.swap_fees.is_empty() {
            warn!("Swap requests will be rejected: swaps require mainnet-beta");
        }
    }

    let lamports_per_signature = get_lamports_per_signature(&provider).await?;
    if lamports_per_signature > policy.lamports_per_signature {
        warn!(
            "Network fee {} lamports per signature exceeds the configured maximum {}; requests will be rejected",
            lamports_per_signature, policy.lamports_per_signature
        );
    }

    let token_fees = policy
        .transfer_fees
        .iter()
        .chain(policy.create_account_fees.iter())
        .chain(policy.swap_fees.iter());
    let missing = build_create_account_list(&provider, &fee_payer, token_fees).await?;
    if missing.is_empty() {
        info!("All fee accounts exist");
        return Ok(());
    }

    for account in &missing {
        warn!("Missing fee account {} for mint {}", account.address, account.mint);
    }
    if !config.create_fee_accounts {
        info!("Set CREATE_FEE_ACCOUNTS=true to create missing fee accounts");
        return Ok(());
    }

    let results = create_fee_accounts(&provider, &signer, &missing).await;
    for result in &results {
        match &result.error {
            None => info!("Created fee account {} for mint {}", result.address, result.mint),
            Some(e) => error!("Failed to create fee account {}: {}", result.address, e),
        }
    }

    Ok(())
}
