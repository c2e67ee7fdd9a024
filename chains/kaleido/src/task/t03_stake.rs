use crate::task::{ensure_allowance, submit_and_confirm, TaskContext};
use crate::utils::abi::{encode_call, pad_address, pad_u256, parse_amount, Selector};
use crate::utils::short_hash;
use crate::utils::token::{self, KLD_DECIMALS};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{Task, TaskResult};
use tracing::info;

const SELECTOR_STAKE: Selector = [0x83, 0x40, 0xf5, 0x49];
const GAS_LIMIT_STAKE: u64 = 738_930;

/// Stakes KLD through the stake router under the fixed referral.
pub struct StakeKld;

#[async_trait]
impl Task<TaskContext> for StakeKld {
    fn name(&self) -> &str {
        "Stake KLD"
    }

    async fn run(&self, ctx: TaskContext) -> Result<TaskResult> {
        let amount = parse_amount(ctx.amount, KLD_DECIMALS)?;

        token::require_balance(
            ctx.rpc.as_ref(),
            ctx.addresses.kld,
            ctx.owner(),
            amount,
            "KLD",
            KLD_DECIMALS,
        )
        .await?;
        ensure_allowance(
            &ctx,
            ctx.addresses.kld,
            ctx.addresses.stake_router,
            amount,
            "KLD",
        )
        .await?;

        let data = encode_call(
            SELECTOR_STAKE,
            &[
                pad_address(ctx.addresses.kld),
                pad_address(ctx.addresses.stake_referral),
                pad_u256(amount),
            ],
        );
        let receipt =
            submit_and_confirm(&ctx, ctx.addresses.stake_router, data, GAS_LIMIT_STAKE).await?;

        let hash = short_hash(&receipt.transaction_hash);
        info!(
            target: "activity",
            "Stake {:.4} KLD Successfully, Hash: {}",
            ctx.amount,
            hash
        );
        Ok(TaskResult {
            success: true,
            message: format!("Staked {:.4} KLD", ctx.amount),
            tx_hash: Some(format!("{:?}", receipt.transaction_hash)),
        })
    }
}
