use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

pub struct ProxyManager;

impl ProxyManager {
    pub const PROXY_FILE: &'static str = "proxy.txt";

    /// Loads proxy URLs from the default `proxy.txt`.
    pub fn load_proxies() -> Result<Vec<String>> {
        Self::load_proxies_from(Self::PROXY_FILE)
    }

    /// Reads a newline-delimited list of proxy URLs (`socks*://` or
    /// `http*://`). A missing file means "run without proxies".
    pub fn load_proxies_from(path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found. Running without proxy.", path.display());
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut proxies = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with("socks") || line.starts_with("http") {
                proxies.push(line.to_string());
            } else {
                warn!("Skipping invalid proxy line: {}", line);
            }
        }

        info!("Loaded {} proxies from {}", proxies.len(), path.display());
        Ok(proxies)
    }

    /// Proxy assigned to the account at `index`: wraps around the
    /// list length, `None` when no proxies are configured.
    pub fn proxy_for(proxies: &[String], index: usize) -> Option<&str> {
        if proxies.is_empty() {
            return None;
        }
        Some(proxies[index % proxies.len()].as_str())
    }
}
