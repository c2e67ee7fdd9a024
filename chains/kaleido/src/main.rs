use anyhow::Result;
use clap::Parser;
use core_logic::{setup_logger, ActivityConfig, KeyManager, ProxyManager, RunContext};
use dotenv::dotenv;
use kaleido_project::activity::ActivityEngine;
use kaleido_project::config::{Addresses, CONFIG_FILE};
use kaleido_project::wallet::{self, Account};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: String,
    #[arg(short, long, default_value = KeyManager::KEY_FILE)]
    keys: String,
    #[arg(short, long, default_value = ProxyManager::PROXY_FILE)]
    proxies: String,
    /// Run a single cycle and exit instead of rescheduling.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = setup_logger();
    // Keep guard alive for file logging
    std::mem::forget(_log_guard);
    dotenv().ok();

    // Route panics through the logger before the process dies.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!(target: "activity", "Fatal error: {}", info);
        default_hook(info);
    }));

    let args = Args::parse();
    info!("Loading config from: {}", args.config);
    let config = ActivityConfig::load(&args.config);

    let addresses = Addresses::kaleido()?;
    let keys = KeyManager::load_keys_from(&args.keys)?;
    let proxies = ProxyManager::load_proxies_from(&args.proxies)?;

    let mut accounts = Vec::new();
    for (index, key) in keys.iter().enumerate() {
        let proxy = ProxyManager::proxy_for(&proxies, index);
        match Account::from_key(index, key, proxy) {
            Ok(account) => accounts.push(account),
            Err(e) => error!(
                target: "activity",
                "Skipping account #{}: {:#}",
                index + 1,
                e
            ),
        }
    }
    if accounts.is_empty() {
        anyhow::bail!("No usable accounts loaded");
    }

    wallet::refresh_all(&mut accounts, &addresses).await;
    wallet::log_summary(&accounts);

    let run = Arc::new(RunContext::new());
    {
        let run = Arc::clone(&run);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(target: "activity", "Stop requested, finishing in-flight work...");
                run.request_stop();
                run.cancel_scheduled();
            }
        });
    }

    let mut engine = ActivityEngine::new(config, addresses, accounts, run);
    if args.once {
        engine.run_once().await?;
    } else {
        engine.run().await?;
    }
    Ok(())
}
