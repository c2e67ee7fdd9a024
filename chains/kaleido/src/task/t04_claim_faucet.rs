use crate::task::{submit_and_confirm, TaskContext};
use crate::utils::abi::{decode_u256, encode_call, pad_address, Selector};
use crate::utils::rpc::ChainRpc;
use crate::utils::{format_wait, short_address, short_hash};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{with_fixed_retry, ActivityError, RetryPolicy, Task, TaskResult};
use ethers::utils::id;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info};

const SELECTOR_CLAIM_USDC: Selector = [0x44, 0x51, 0xd8, 0x9f];
const SELECTOR_CLAIM_KLD: Selector = [0x45, 0xd3, 0xb1, 0xf7];
/// KLD last-claimed slot is read through this raw accessor; it is not
/// the same entry point as `lastClaimed(address)` and the two paths
/// stay separate.
const SELECTOR_LAST_CLAIMED_KLD: Selector = [0xaf, 0xa4, 0xd6, 0x31];

const GAS_LIMIT_FAUCET: u64 = 2_100_000;
const MAX_CLAIM_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(10);
/// Pause between the two sub-claims when the first one landed.
const CLAIM_DELAY: Duration = Duration::from_secs(10);

pub fn is_eligible(last_claimed: u64, cooldown: u64, now: u64) -> bool {
    last_claimed == 0 || now.saturating_sub(last_claimed) >= cooldown
}

pub fn remaining_wait(last_claimed: u64, cooldown: u64, now: u64) -> u64 {
    cooldown.saturating_sub(now.saturating_sub(last_claimed))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

async fn read_cooldown(ctx: &TaskContext) -> Result<u64> {
    let out = ctx
        .rpc
        .call(ctx.addresses.faucet_router, encode_call(id("COOLDOWN()"), &[]))
        .await?;
    Ok(decode_u256(&out)?.low_u64())
}

async fn last_claimed_usdc(ctx: &TaskContext) -> Result<u64> {
    let data = encode_call(id("lastClaimed(address)"), &[pad_address(ctx.owner())]);
    let out = ctx.rpc.call(ctx.addresses.faucet_router, data).await?;
    Ok(decode_u256(&out)?.low_u64())
}

/// A failed read counts as never-claimed, so the claim is attempted
/// and the router is left to reject it.
async fn last_claimed_kld(ctx: &TaskContext) -> u64 {
    let data = encode_call(SELECTOR_LAST_CLAIMED_KLD, &[pad_address(ctx.owner())]);
    match ctx.rpc.call(ctx.addresses.faucet_router, data).await {
        Ok(out) => decode_u256(&out).map(|v| v.low_u64()).unwrap_or(0),
        Err(e) => {
            error!(
                target: "activity",
                "Failed to check KLD last claimed time for {}: {:#}",
                short_address(&ctx.owner()),
                e
            );
            0
        }
    }
}

/// One sub-claim: up to 3 attempts, fixed 10s between. Exhaustion is
/// logged and reported as `false`; only a stop request propagates.
async fn claim_with_retry(ctx: &TaskContext, selector: Selector, symbol: &str) -> Result<bool> {
    info!(
        target: "activity",
        "Claiming Faucet {} for {}",
        symbol,
        short_address(&ctx.owner())
    );
    let policy = RetryPolicy::new(MAX_CLAIM_ATTEMPTS, RETRY_DELAY);
    let operation = format!("{} faucet claim", symbol);
    let result = with_fixed_retry(policy, &ctx.run, &operation, || {
        let ctx = ctx.clone();
        let symbol = symbol.to_string();
        async move {
            let data = encode_call(selector, &[]);
            let receipt =
                submit_and_confirm(&ctx, ctx.addresses.faucet_router, data, GAS_LIMIT_FAUCET)
                    .await?;
            info!(
                target: "activity",
                "Claim Faucet {} Successfully, Hash: {}",
                symbol,
                short_hash(&receipt.transaction_hash)
            );
            Ok(())
        }
    })
    .await;

    match result {
        Ok(()) => Ok(true),
        Err(e) if matches!(e.downcast_ref::<ActivityError>(), Some(ActivityError::Cancelled)) => {
            Err(e)
        }
        Err(e) => {
            error!(
                target: "activity",
                "Claim Faucet {} failed for {}: {:#}",
                symbol,
                short_address(&ctx.owner()),
                e
            );
            Ok(false)
        }
    }
}

/// Claims both faucets when eligible. Each token has its own cooldown
/// check; a failed sub-claim never blocks the other one.
pub struct ClaimFaucet;

#[async_trait]
impl Task<TaskContext> for ClaimFaucet {
    fn name(&self) -> &str {
        "Claim Faucet"
    }

    async fn run(&self, ctx: TaskContext) -> Result<TaskResult> {
        info!(
            target: "activity",
            "Checking faucet eligibility for {}",
            short_address(&ctx.owner())
        );
        let cooldown = read_cooldown(&ctx).await?;

        let mut usdc_success = false;
        let now = unix_now();
        let claimed_usdc = last_claimed_usdc(&ctx).await?;
        if is_eligible(claimed_usdc, cooldown, now) {
            usdc_success = claim_with_retry(&ctx, SELECTOR_CLAIM_USDC, "USDC").await?;
        } else {
            info!(
                target: "activity",
                "USDC faucet already claimed by {}. Next claim in {}",
                short_address(&ctx.owner()),
                format_wait(remaining_wait(claimed_usdc, cooldown, now))
            );
        }

        if usdc_success {
            ctx.run.sleep(CLAIM_DELAY).await;
        }

        let mut kld_success = false;
        let now = unix_now();
        let claimed_kld = last_claimed_kld(&ctx).await;
        if is_eligible(claimed_kld, cooldown, now) {
            kld_success = claim_with_retry(&ctx, SELECTOR_CLAIM_KLD, "KLD").await?;
        } else {
            info!(
                target: "activity",
                "KLD faucet already claimed by {}. Next claim in {}",
                short_address(&ctx.owner()),
                format_wait(remaining_wait(claimed_kld, cooldown, now))
            );
        }

        let success = usdc_success || kld_success;
        Ok(TaskResult {
            success,
            message: format!(
                "Faucet claim: USDC {}, KLD {}",
                if usdc_success { "claimed" } else { "skipped" },
                if kld_success { "claimed" } else { "skipped" },
            ),
            tx_hash: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_claimed_is_eligible() {
        assert!(is_eligible(0, 86_400, 1_700_000_000));
    }

    #[test]
    fn cooldown_elapsed_is_eligible() {
        let now = 1_700_000_000;
        assert!(is_eligible(now - 86_400, 86_400, now));
        assert!(is_eligible(now - 100_000, 86_400, now));
    }

    #[test]
    fn within_cooldown_is_ineligible_with_remaining_wait() {
        let now = 1_700_000_000;
        let last = now - 500;
        assert!(!is_eligible(last, 86_400, now));
        assert_eq!(remaining_wait(last, 86_400, now), 86_400 - 500);
    }
}
