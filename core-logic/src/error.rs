//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Errors raised by on-chain activity operations.
///
/// Every failure mode of a single action (deposit, lend, stake, one
/// faucet attempt) maps to one of these variants. The engine catches
/// them per action and keeps going; only `Cancelled` short-circuits a
/// run, and it is a state transition rather than a fault.
#[derive(Error, Debug, Clone)]
pub enum ActivityError {
    #[error("RPC call failed ({method}): {message} (code: {code})")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Invalid wallet address: {address}")]
    InvalidAddress { address: String },

    #[error("Insufficient {symbol} balance: need {required}, have {available}")]
    InsufficientBalance {
        symbol: String,
        required: String,
        available: String,
    },

    #[error("Transaction reverted: {hash}")]
    TransactionReverted { hash: String },

    #[error("Process stopped")]
    Cancelled,
}

/// Configuration loading and persistence errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error for {path}: {msg}")]
    Io { path: String, msg: String },

    #[error("Malformed config file {path}: {msg}")]
    Malformed { path: String, msg: String },
}
