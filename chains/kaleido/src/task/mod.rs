pub mod t01_deposit;
pub mod t02_lend;
pub mod t03_stake;
pub mod t04_claim_faucet;

use crate::config::Addresses;
use crate::utils::nonce_manager::NonceTracker;
use crate::utils::rpc::{wait_for_receipt, ChainRpc};
use crate::utils::token::{self, GAS_LIMIT_APPROVE};
use crate::utils::{short_address, short_hash};
use anyhow::Result;
use core_logic::{ActivityError, RunContext, Task};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, U256};
use std::sync::Arc;
use tracing::info;

pub use t01_deposit::DepositUsdc;
pub use t02_lend::LendUsdc;
pub use t03_stake::StakeKld;
pub use t04_claim_faucet::ClaimFaucet;

/// Everything one action needs for one repetition: the account's
/// transport and signer, the contract surface, shared nonce state,
/// run control, and the drawn amount.
#[derive(Clone)]
pub struct TaskContext {
    pub rpc: Arc<dyn ChainRpc>,
    pub signer: LocalWallet,
    pub addresses: Addresses,
    pub nonces: Arc<NonceTracker>,
    pub run: Arc<RunContext>,
    pub amount: f64,
}

impl TaskContext {
    pub fn owner(&self) -> Address {
        self.signer.address()
    }
}

pub type KaleidoTask = Arc<dyn Task<TaskContext>>;

/// The one submission path every write goes through: assign a nonce,
/// price the gas, sign a legacy transaction, broadcast, and wait for
/// a non-reverted receipt.
pub async fn submit_and_confirm(
    ctx: &TaskContext,
    to: Address,
    data: Bytes,
    gas_limit: u64,
) -> Result<TransactionReceipt> {
    let nonce = ctx
        .nonces
        .next_nonce(ctx.rpc.as_ref(), &ctx.run, ctx.owner())
        .await?;
    let gas_price = ctx.rpc.gas_price().await?;

    let tx: TypedTransaction = TransactionRequest::new()
        .from(ctx.owner())
        .to(to)
        .data(data)
        .gas(gas_limit)
        .gas_price(gas_price)
        .nonce(nonce)
        .chain_id(ctx.addresses.chain_id)
        .value(U256::zero())
        .into();

    let signature = ctx.signer.sign_transaction(&tx).await?;
    let raw = tx.rlp_signed(&signature);
    let hash = ctx.rpc.send_raw_transaction(raw).await?;
    info!(
        target: "activity",
        "Transaction sent for {}: {}",
        short_address(&ctx.owner()),
        short_hash(&hash)
    );

    let receipt = wait_for_receipt(ctx.rpc.as_ref(), &ctx.run, hash).await?;
    if receipt.status == Some(0u64.into()) {
        return Err(ActivityError::TransactionReverted {
            hash: format!("{:?}", hash),
        }
        .into());
    }
    Ok(receipt)
}

/// Approve-then-send half of the action protocol. Approves exactly
/// the required amount and waits for inclusion; an existing allowance
/// covering the amount skips the approval entirely.
pub async fn ensure_allowance(
    ctx: &TaskContext,
    token_address: Address,
    spender: Address,
    amount: U256,
    symbol: &str,
) -> Result<()> {
    let current = token::allowance(ctx.rpc.as_ref(), token_address, ctx.owner(), spender).await?;
    if current >= amount {
        return Ok(());
    }
    info!(
        target: "activity",
        "Approving {:.4} {} for {}",
        ctx.amount,
        symbol,
        short_address(&spender)
    );
    let data = token::approve_calldata(spender, amount);
    let receipt = submit_and_confirm(ctx, token_address, data, GAS_LIMIT_APPROVE).await?;
    info!(
        target: "activity",
        "Approval {} Successfully, Hash: {}",
        symbol,
        short_hash(&receipt.transaction_hash)
    );
    Ok(())
}
