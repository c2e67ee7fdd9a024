use crate::task::{ensure_allowance, submit_and_confirm, TaskContext};
use crate::utils::abi::{encode_call, pad_address, pad_u256, parse_amount, Selector};
use crate::utils::short_hash;
use crate::utils::token::{self, USDC_DECIMALS};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{Task, TaskResult};
use ethers::types::U256;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

const SELECTOR_LEND: Selector = [0x50, 0x68, 0xa8, 0x8a];
const GAS_LIMIT_LEND: u64 = 977_416;

/// Router-fixed fee rate argument (basis points).
const LEND_FEE_RATE: u64 = 500;

/// Opens a USDC lending position through the deposit router. The
/// position expires 3 to 4 days out, drawn per repetition.
pub struct LendUsdc;

fn lend_expiry(now_secs: u64) -> u64 {
    let days = rand::thread_rng().gen_range(3..5u64);
    now_secs + days * 24 * 60 * 60
}

#[async_trait]
impl Task<TaskContext> for LendUsdc {
    fn name(&self) -> &str {
        "Lend USDC"
    }

    async fn run(&self, ctx: TaskContext) -> Result<TaskResult> {
        let amount = parse_amount(ctx.amount, USDC_DECIMALS)?;

        token::require_balance(
            ctx.rpc.as_ref(),
            ctx.addresses.usdc,
            ctx.owner(),
            amount,
            "USDC",
            USDC_DECIMALS,
        )
        .await?;
        ensure_allowance(
            &ctx,
            ctx.addresses.usdc,
            ctx.addresses.deposit_router,
            amount,
            "USDC",
        )
        .await?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let expiry = lend_expiry(now);

        let data = encode_call(
            SELECTOR_LEND,
            &[
                pad_u256(amount),
                pad_u256(U256::zero()),
                pad_u256(amount),
                pad_u256(U256::from(expiry)),
                pad_u256(U256::from(LEND_FEE_RATE)),
                pad_address(ctx.addresses.usdc),
            ],
        );
        let receipt =
            submit_and_confirm(&ctx, ctx.addresses.deposit_router, data, GAS_LIMIT_LEND).await?;

        let hash = short_hash(&receipt.transaction_hash);
        info!(
            target: "activity",
            "Lend {:.4} USDC Successfully, Hash: {}",
            ctx.amount,
            hash
        );
        Ok(TaskResult {
            success: true,
            message: format!("Lent {:.4} USDC", ctx.amount),
            tx_hash: Some(format!("{:?}", receipt.transaction_hash)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_lands_three_to_four_days_out() {
        let now = 1_700_000_000u64;
        for _ in 0..50 {
            let expiry = lend_expiry(now);
            let days = (expiry - now) / 86_400;
            assert!((3..=4).contains(&days));
        }
    }
}
