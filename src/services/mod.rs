//! # Services Module
//!
//! External collaborators of the relay core: the ledger client, the fee payer
//! signer, the idempotency cache and the swap capability.

pub mod cache;
pub use cache::*;

pub mod provider;
pub use provider::*;

pub mod signer;
pub use signer::*;

pub mod swap;
pub use swap::*;
