//! # Kaleido Testnet Activity Bot
//!
//! Automates daily on-chain activity (USDC deposits, lending, KLD
//! staking and faucet claims) for a set of wallets against the Kaleido
//! testnet routers, with randomized amounts and delays, per-account
//! proxies, nonce tracking and cooperative stop handling.

pub mod activity;
pub mod config;
pub mod task;
pub mod utils;
pub mod wallet;
