//! Gasless transaction relay for Solana.
//!
//! Users submit transactions that pay the relay a token fee; the relay
//! validates them, co-signs as fee payer and simulates them before they are
//! broadcast.
pub mod config;
pub mod constants;
pub mod domain;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;
