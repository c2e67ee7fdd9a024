use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use tracing::{info, warn};

pub struct KeyManager;

impl KeyManager {
    pub const KEY_FILE: &'static str = "pk.txt";

    /// Loads signing keys from the default `pk.txt`.
    pub fn load_keys() -> Result<Vec<String>> {
        Self::load_keys_from(Self::KEY_FILE)
    }

    /// Reads a newline-delimited key list, keeping only lines that
    /// are 64 hex chars with an optional `0x` prefix. Invalid lines
    /// are filtered out before the engine ever sees them.
    pub fn load_keys_from(path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let key_re = Regex::new(r"^(0x)?[0-9a-fA-F]{64}$").expect("static regex");

        let mut keys = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if key_re.is_match(line) {
                keys.push(line.to_string());
            } else {
                warn!("Skipping invalid private key line in {}", path.display());
            }
        }

        if keys.is_empty() {
            anyhow::bail!("No valid private keys in {}", path.display());
        }

        info!("Loaded {} private keys from {}", keys.len(), path.display());
        Ok(keys)
    }
}
