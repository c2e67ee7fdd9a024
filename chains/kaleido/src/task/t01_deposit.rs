use crate::task::{ensure_allowance, submit_and_confirm, TaskContext};
use crate::utils::abi::{encode_call, pad_address, pad_u256, parse_amount, Selector};
use crate::utils::short_hash;
use crate::utils::token::{self, USDC_DECIMALS};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{Task, TaskResult};
use tracing::info;

const SELECTOR_DEPOSIT: Selector = [0xa5, 0xd5, 0xdb, 0x0c];
const GAS_LIMIT_DEPOSIT: u64 = 691_650;

/// Deposits USDC collateral into the deposit router.
pub struct DepositUsdc;

#[async_trait]
impl Task<TaskContext> for DepositUsdc {
    fn name(&self) -> &str {
        "Deposit USDC"
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

        let data = encode_call(
            SELECTOR_DEPOSIT,
            &[pad_address(ctx.addresses.usdc), pad_u256(amount)],
        );
        let receipt =
            submit_and_confirm(&ctx, ctx.addresses.deposit_router, data, GAS_LIMIT_DEPOSIT)
                .await?;

        let hash = short_hash(&receipt.transaction_hash);
        info!(
            target: "activity",
            "Deposit {:.4} USDC Successfully, Hash: {}",
            ctx.amount,
            hash
        );
        Ok(TaskResult {
            success: true,
            message: format!("Deposited {:.4} USDC", ctx.amount),
            tx_hash: Some(format!("{:?}", receipt.transaction_hash)),
        })
    }
}
