use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, time::Duration};
use thiserror::Error;

use crate::{
    constants::{
        DEFAULT_LAMPORTS_PER_SIGNATURE, DEFAULT_MAX_SIGNATURES, DEFAULT_SAME_MINT_TIMEOUT_MS,
        DEFAULT_SAME_SOURCE_TIMEOUT_MS,
    },
    models::{FeeTable, LockoutPolicy, RelayPolicy, SerializableTokenFee, TokenFee, TokenFeeError},
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnv { name: String, value: String },
    #[error("Invalid signature limit: {0}")]
    InvalidSignatureLimit(String),
    #[error("Invalid token in endpoint {endpoint}: {source}")]
    InvalidToken {
        endpoint: String,
        source: TokenFeeError,
    },
    #[error("Duplicate mint {mint} in endpoint {endpoint}")]
    DuplicateMint { endpoint: String, mint: String },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Accepted fee tokens for one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub tokens: Vec<SerializableTokenFee>,
}

impl EndpointConfig {
    fn validate(&self, endpoint: &str) -> Result<(), ConfigError> {
        let mut seen_mints = HashSet::new();
        for token in &self.tokens {
            TokenFee::try_from(token.clone()).map_err(|source| ConfigError::InvalidToken {
                endpoint: endpoint.to_string(),
                source,
            })?;
            if !seen_mints.insert(&token.mint) {
                return Err(ConfigError::DuplicateMint {
                    endpoint: endpoint.to_string(),
                    mint: token.mint.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn fee_table(&self, endpoint: &str) -> Result<FeeTable, ConfigError> {
        self.tokens
            .iter()
            .cloned()
            .map(|token| {
                TokenFee::try_from(token).map_err(|source| ConfigError::InvalidToken {
                    endpoint: endpoint.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FeeTable::new)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub transfer: EndpointConfig,
    #[serde(default)]
    pub create_associated_token_account: EndpointConfig,
    #[serde(default)]
    pub whirlpools_swap: EndpointConfig,
}

fn default_max_signatures() -> usize {
    DEFAULT_MAX_SIGNATURES
}

fn default_lamports_per_signature() -> u64 {
    DEFAULT_LAMPORTS_PER_SIGNATURE
}

fn default_same_source_timeout_ms() -> u64 {
    DEFAULT_SAME_SOURCE_TIMEOUT_MS
}

fn default_same_mint_timeout_ms() -> u64 {
    DEFAULT_SAME_MINT_TIMEOUT_MS
}

fn default_require_mainnet_for_swap() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_signatures")]
    pub max_signatures: usize,
    #[serde(default = "default_lamports_per_signature")]
    pub lamports_per_signature: u64,
    #[serde(default = "default_same_source_timeout_ms")]
    pub same_source_timeout_ms: u64,
    #[serde(default = "default_same_mint_timeout_ms")]
    pub same_mint_timeout_ms: u64,
    #[serde(default)]
    pub lockout_policy: LockoutPolicy,
    #[serde(default = "default_require_mainnet_for_swap")]
    pub require_mainnet_for_swap: bool,
    pub endpoints: EndpointsConfig,
}

impl Config {
    /// Signatures that still fit in a single packet
    const MAX_SIGNATURES: usize = 12;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_signatures == 0 || self.max_signatures > Self::MAX_SIGNATURES {
            return Err(ConfigError::InvalidSignatureLimit(format!(
                "max_signatures must be between 1 and {}, got {}",
                Self::MAX_SIGNATURES,
                self.max_signatures
            )));
        }
        if self.endpoints.transfer.tokens.is_empty() {
            return Err(ConfigError::MissingField("endpoints.transfer.tokens".into()));
        }

        self.endpoints.transfer.validate("transfer")?;
        self.endpoints
            .create_associated_token_account
            .validate("create_associated_token_account")?;
        self.endpoints.whirlpools_swap.validate("whirlpools_swap")?;
        Ok(())
    }

    /// Builds the immutable policy every relay action runs against.
    pub fn to_relay_policy(&self, cache_ttl: Duration) -> Result<RelayPolicy, ConfigError> {
        Ok(RelayPolicy {
            max_signatures: self.max_signatures,
            lamports_per_signature: self.lamports_per_signature,
            same_source_timeout: Duration::from_millis(self.same_source_timeout_ms),
            same_mint_timeout: Duration::from_millis(self.same_mint_timeout_ms),
            lockout_policy: self.lockout_policy,
            cache_ttl,
            require_mainnet_for_swap: self.require_mainnet_for_swap,
            transfer_fees: self.endpoints.transfer.fee_table("transfer")?,
            create_account_fees: self
                .endpoints
                .create_associated_token_account
                .fee_table("create_associated_token_account")?,
            swap_fees: self.endpoints.whirlpools_swap.fee_table("whirlpools_swap")?,
        })
    }
}

pub fn load_config(config_file_path: &str) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(config_file_path)?;
    let config: Config = serde_json::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn token(mint: &Pubkey) -> SerializableTokenFee {
        SerializableTokenFee {
            mint: mint.to_string(),
            account: Pubkey::new_unique().to_string(),
            decimals: 6,
            fee: 100,
        }
    }

    fn create_valid_config() -> Config {
        Config {
            max_signatures: 2,
            lamports_per_signature: 5000,
            same_source_timeout_ms: 5000,
            same_mint_timeout_ms: 3000,
            lockout_policy: LockoutPolicy::HardLockout,
            require_mainnet_for_swap: true,
            endpoints: EndpointsConfig {
                transfer: EndpointConfig {
                    tokens: vec![token(&Pubkey::new_unique())],
                },
                create_associated_token_account: EndpointConfig::default(),
                whirlpools_swap: EndpointConfig::default(),
            },
        }
    }

    #[test]
    fn test_valid_config_validation() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signature_limit_bounds() {
        let mut config = create_valid_config();
        config.max_signatures = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSignatureLimit(_))
        ));

        config.max_signatures = 13;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSignatureLimit(_))
        ));
    }

    #[test]
    fn test_empty_transfer_tokens() {
        let mut config = create_valid_config();
        config.endpoints.transfer.tokens.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_invalid_token_address() {
        let mut config = create_valid_config();
        config.endpoints.whirlpools_swap.tokens.push(SerializableTokenFee {
            mint: "not-a-key".to_string(),
            account: Pubkey::new_unique().to_string(),
            decimals: 6,
            fee: 1,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidToken { endpoint, .. }) if endpoint == "whirlpools_swap"
        ));
    }

    #[test]
    fn test_duplicate_mints() {
        let mut config = create_valid_config();
        let mint = Pubkey::new_unique();
        config.endpoints.transfer.tokens = vec![token(&mint), token(&mint)];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateMint { .. })
        ));
    }

    #[test]
    fn test_same_mint_allowed_across_endpoints() {
        let mut config = create_valid_config();
        let mint = Pubkey::new_unique();
        config.endpoints.transfer.tokens = vec![token(&mint)];
        config.endpoints.whirlpools_swap.tokens = vec![token(&mint)];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_relay_policy() {
        let mut config = create_valid_config();
        config.lockout_policy = LockoutPolicy::HoldDuringFlight;
        let mint = Pubkey::new_unique();
        config.endpoints.create_associated_token_account.tokens = vec![token(&mint)];

        let policy = config.to_relay_policy(Duration::from_secs(30)).unwrap();

        assert_eq!(policy.max_signatures, 2);
        assert_eq!(policy.same_source_timeout, Duration::from_millis(5000));
        assert_eq!(policy.cache_ttl, Duration::from_secs(30));
        assert_eq!(policy.lockout_policy, LockoutPolicy::HoldDuringFlight);
        assert_eq!(policy.transfer_fees.len(), 1);
        assert!(policy.create_account_fees.find_by_mint(&mint).is_some());
        assert!(policy.swap_fees.is_empty());
    }

    #[test]
    fn test_load_config_applies_defaults() {
        let mint = Pubkey::new_unique();
        let account = Pubkey::new_unique();
        let json = format!(
            r#"{{
                "endpoints": {{
                    "transfer": {{
                        "tokens": [{{"mint": "{mint}", "account": "{account}", "decimals": 6, "fee": 1000}}]
                    }}
                }}
            }}"#
        );
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.max_signatures, DEFAULT_MAX_SIGNATURES);
        assert_eq!(config.same_mint_timeout_ms, DEFAULT_SAME_MINT_TIMEOUT_MS);
        assert_eq!(config.lockout_policy, LockoutPolicy::HardLockout);
        assert!(config.require_mainnet_for_swap);
        assert!(config.endpoints.whirlpools_swap.tokens.is_empty());
        assert_eq!(config.endpoints.transfer.tokens[0].fee, 1000);
    }

    #[test]
    fn test_load_config_parses_lockout_policy() {
        let json = format!(
            r#"{{
                "lockout_policy": "hold_during_flight",
                "max_signatures": 3,
                "endpoints": {{
                    "transfer": {{
                        "tokens": [{{"mint": "{}", "account": "{}", "decimals": 9, "fee": 1}}]
                    }}
                }}
            }}"#,
            Pubkey::new_unique(),
            Pubkey::new_unique()
        );
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.lockout_policy, LockoutPolicy::HoldDuringFlight);
        assert_eq!(config.max_signatures, 3);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/config.json"),
            Err(ConfigError::IoError(_))
        ));
    }
}
