//! # Core Logic - Shared Utilities for the Activity Bot
//!
//! Chain-agnostic building blocks used by the Kaleido bot: typed
//! errors, persisted activity configuration, logger setup, run
//! control (stop flag, in-flight counter, interruptible sleep),
//! bounded retry, and key/proxy list loading.
//!
//! ## Modules
//!
//! - [`config`] - Daily activity configuration with JSON persistence
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - Core trait definitions
//! - [`utils`] - Utility modules (run control, retry, logging, keys, proxies)

pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

pub use config::ActivityConfig;
pub use error::{ActivityError, ConfigError};
pub use traits::{CycleStats, Task, TaskResult};

pub use utils::{setup_logger, KeyManager, ProxyManager, RunContext, RunState};

// Export retry and run-control internals used by the chain crates
pub use utils::retry::{with_fixed_retry, RetryPolicy};
pub use utils::run_control::POLL_INTERVAL;
