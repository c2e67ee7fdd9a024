use crate::error::ActivityError;
use crate::utils::run_control::RunContext;
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry with a fixed inter-attempt delay.
///
/// This is deliberately simpler than an exponential-backoff policy:
/// the faucet claim is the only consumer and its protocol is "try up
/// to N times, waiting a constant delay between attempts".
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Runs `operation` up to `policy.max_attempts` times, sleeping
/// `policy.delay` through the interruptible sleep between attempts.
/// An active stop request ends the loop with `Cancelled`; exhaustion
/// returns the last error wrapped with attempt context.
pub async fn with_fixed_retry<T, F, Fut>(
    policy: RetryPolicy,
    ctx: &RunContext,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if ctx.is_stopped() {
            return Err(ActivityError::Cancelled.into());
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                warn!(
                    target: "activity",
                    "Attempt {} - {} failed: {:#}",
                    attempt, operation_name, e
                );
                if attempt == policy.max_attempts {
                    return Err(e).context(format!(
                        "{} failed after {} attempts",
                        operation_name, policy.max_attempts
                    ));
                }
                if ctx.is_stopped() {
                    return Err(ActivityError::Cancelled.into());
                }
                debug!(
                    "Retrying {} in {} seconds...",
                    operation_name,
                    policy.delay.as_secs()
                );
                ctx.sleep(policy.delay).await;
            }
        }
    }

    unreachable!()
}
