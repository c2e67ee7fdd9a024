use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Per-action repetition counts, amount ranges and delays for the
/// daily activity cycle.
///
/// Persisted as camelCase JSON. Loading is lenient: any missing,
/// non-numeric or non-positive field falls back to its default, and a
/// range with min > max is reset wholesale. The faucet claim is fixed
/// at one per account per cycle and deliberately has no field here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityConfig {
    pub deposit_repetitions: u32,
    pub min_amount_deposit: f64,
    pub max_amount_deposit: f64,
    pub lend_repetitions: u32,
    pub min_amount_lend: f64,
    pub max_amount_lend: f64,
    pub stake_repetitions: u32,
    pub min_amount_stake: f64,
    pub max_amount_stake: f64,
    #[serde(rename = "actionDelay")]
    pub action_delay_ms: u64,
    #[serde(rename = "accountDelay")]
    pub account_delay_ms: u64,
    pub cycle_interval_hours: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            deposit_repetitions: 1,
            min_amount_deposit: 0.1,
            max_amount_deposit: 0.5,
            lend_repetitions: 1,
            min_amount_lend: 0.1,
            max_amount_lend: 0.5,
            stake_repetitions: 1,
            min_amount_stake: 10.0,
            max_amount_stake: 50.0,
            action_delay_ms: 10_000,
            account_delay_ms: 10_000,
            cycle_interval_hours: 1,
        }
    }
}

fn f64_or(value: &Value, key: &str, default: f64) -> f64 {
    match value.get(key).and_then(Value::as_f64) {
        Some(v) if v > 0.0 && v.is_finite() => v,
        _ => default,
    }
}

fn u32_or(value: &Value, key: &str, default: u32) -> u32 {
    match value.get(key).and_then(Value::as_u64) {
        Some(v) if v >= 1 => v.min(u32::MAX as u64) as u32,
        _ => default,
    }
}

fn u64_or(value: &Value, key: &str, default: u64) -> u64 {
    match value.get(key).and_then(Value::as_u64) {
        Some(v) if v >= 1 => v,
        _ => default,
    }
}

impl ActivityConfig {
    /// Loads the config from `path`, defaulting every field that is
    /// missing or out of range. A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file found, using default settings.");
            return Self::default();
        }

        let raw = match std::fs::read_to_string(path) {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!("Failed to parse config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Field-by-field lenient extraction with per-field defaulting.
    pub fn from_value(value: &Value) -> Self {
        let d = Self::default();
        let mut cfg = Self {
            deposit_repetitions: u32_or(value, "depositRepetitions", d.deposit_repetitions),
            min_amount_deposit: f64_or(value, "minAmountDeposit", d.min_amount_deposit),
            max_amount_deposit: f64_or(value, "maxAmountDeposit", d.max_amount_deposit),
            lend_repetitions: u32_or(value, "lendRepetitions", d.lend_repetitions),
            min_amount_lend: f64_or(value, "minAmountLend", d.min_amount_lend),
            max_amount_lend: f64_or(value, "maxAmountLend", d.max_amount_lend),
            stake_repetitions: u32_or(value, "stakeRepetitions", d.stake_repetitions),
            min_amount_stake: f64_or(value, "minAmountStake", d.min_amount_stake),
            max_amount_stake: f64_or(value, "maxAmountStake", d.max_amount_stake),
            action_delay_ms: u64_or(value, "actionDelay", d.action_delay_ms),
            account_delay_ms: u64_or(value, "accountDelay", d.account_delay_ms),
            cycle_interval_hours: u64_or(value, "cycleIntervalHours", d.cycle_interval_hours),
        };
        cfg.sanitize();
        cfg
    }

    /// Enforces the range invariants: min <= max for every amount
    /// range (a violating range resets to defaults) and a cycle
    /// interval of at least one hour.
    pub fn sanitize(&mut self) {
        let d = Self::default();
        if self.min_amount_deposit > self.max_amount_deposit {
            self.min_amount_deposit = d.min_amount_deposit;
            self.max_amount_deposit = d.max_amount_deposit;
        }
        if self.min_amount_lend > self.max_amount_lend {
            self.min_amount_lend = d.min_amount_lend;
            self.max_amount_lend = d.max_amount_lend;
        }
        if self.min_amount_stake > self.max_amount_stake {
            self.min_amount_stake = d.min_amount_stake;
            self.max_amount_stake = d.max_amount_stake;
        }
        if self.cycle_interval_hours < 1 {
            self.cycle_interval_hours = 1;
        }
    }

    /// Writes the config back to `path` as pretty JSON. Called
    /// whenever a field changes through user configuration.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        info!("Configuration saved successfully.");
        Ok(())
    }
}
