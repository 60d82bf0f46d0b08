//! # Relay
//!
//! Validation and co-signing of user transactions whose network fee is paid
//! by the relay's fee payer.
//!
//! Checks are composed by the actions in [`actions`]; each check is usable on
//! its own.
mod account_init;
mod cache_policy;
mod cosign;
mod error;
mod fee_accounts;
mod instructions;
mod message_token;
mod transfer;
mod validation;

pub mod actions;

#[cfg(test)]
pub mod test_setup;

pub use account_init::*;
pub use actions::*;
pub use cache_policy::*;
pub use cosign::*;
pub use error::*;
pub use fee_accounts::*;
pub use instructions::*;
pub use message_token::*;
pub use transfer::*;
pub use validation::*;
