use crate::config::{Addresses, KALEIDO_CHAIN_ID, KALEIDO_RPC_URL};
use crate::utils::abi::format_amount;
use crate::utils::rpc::{ChainRpc, RpcClient};
use crate::utils::token::{self, KLD_DECIMALS, USDC_DECIMALS};
use crate::utils::short_address;
use anyhow::{Context, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct Balances {
    pub native: U256,
    pub usdc: U256,
    pub kld: U256,
}

/// One funded wallet with its own (optionally proxied) RPC transport.
pub struct Account {
    pub index: usize,
    pub signer: LocalWallet,
    pub address: Address,
    pub proxy: Option<String>,
    pub rpc: Arc<dyn ChainRpc>,
    pub balances: Balances,
}

impl Account {
    pub fn from_key(index: usize, key: &str, proxy: Option<&str>) -> Result<Self> {
        let signer: LocalWallet = key
            .parse::<LocalWallet>()
            .context("Invalid private key")?
            .with_chain_id(KALEIDO_CHAIN_ID);
        let rpc: Arc<dyn ChainRpc> = Arc::new(RpcClient::new(KALEIDO_RPC_URL, proxy)?);
        Ok(Self::with_rpc(index, signer, proxy.map(String::from), rpc))
    }

    pub fn with_rpc(
        index: usize,
        signer: LocalWallet,
        proxy: Option<String>,
        rpc: Arc<dyn ChainRpc>,
    ) -> Self {
        let address = signer.address();
        Self {
            index,
            signer,
            address,
            proxy,
            rpc,
            balances: Balances::default(),
        }
    }

    pub fn label(&self) -> String {
        format!("Account #{} ({})", self.index + 1, short_address(&self.address))
    }
}

/// Fetches native, USDC and KLD balances for every account at once.
/// A failed fetch keeps that account's previous snapshot.
pub async fn refresh_all(accounts: &mut [Account], addrs: &Addresses) {
    let results = {
        let fetches = accounts.iter().map(|account| {
            let rpc = Arc::clone(&account.rpc);
            let address = account.address;
            let usdc = addrs.usdc;
            let kld = addrs.kld;
            async move {
                let native = rpc.get_balance(address).await?;
                let usdc = token::balance_of(rpc.as_ref(), usdc, address).await?;
                let kld = token::balance_of(rpc.as_ref(), kld, address).await?;
                Ok::<Balances, anyhow::Error>(Balances { native, usdc, kld })
            }
        });
        futures::future::join_all(fetches).await
    };

    for (account, result) in accounts.iter_mut().zip(results) {
        match result {
            Ok(balances) => account.balances = balances,
            Err(e) => error!(
                target: "activity",
                "Failed to fetch balances for {}: {:#}",
                account.label(),
                e
            ),
        }
    }
}

/// Startup summary table, one line per wallet.
pub fn log_summary(accounts: &[Account]) {
    info!(target: "activity", "Loaded {} wallet(s)", accounts.len());
    for account in accounts {
        info!(
            target: "activity",
            "{} | ETH {} | USDC {} | KLD {}{}",
            account.label(),
            format_amount(account.balances.native, 18, 4),
            format_amount(account.balances.usdc, USDC_DECIMALS, 2),
            format_amount(account.balances.kld, KLD_DECIMALS, 2),
            match &account.proxy {
                Some(p) => format!(" | proxy {}", p),
                None => String::new(),
            }
        );
    }
}
