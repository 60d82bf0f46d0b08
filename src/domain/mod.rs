//! # Domain Module
//!
//! Core domain logic for the relay: transaction validation, anti-abuse
//! caching, co-signing and the actions that compose them.

pub mod relay;
pub use relay::*;
