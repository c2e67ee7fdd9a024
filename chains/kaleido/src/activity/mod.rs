//! Daily activity cycle orchestration.
//!
//! Accounts and actions run strictly sequentially; the only concurrent
//! path is the read-only balance refresh. Every delay goes through the
//! interruptible sleep, and every loop boundary re-checks the stop
//! flag, so a stop request halts before the next account or action.

use crate::config::Addresses;
use crate::task::{ClaimFaucet, DepositUsdc, KaleidoTask, LendUsdc, StakeKld, TaskContext};
use crate::utils::format_wait;
use crate::utils::nonce_manager::NonceTracker;
use crate::wallet::{self, Account};
use anyhow::Result;
use core_logic::{ActivityConfig, CycleStats, RunContext, Task};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Fixed pause after each action phase, letting state settle before
/// the next phase reads balances.
const SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Inter-repetition delay window, independent of configuration.
const REP_DELAY_MIN_MS: u64 = 10_000;
const REP_DELAY_MAX_MS: u64 = 30_000;

struct Phase {
    task: KaleidoTask,
    repetitions: u32,
    min_amount: f64,
    max_amount: f64,
}

pub struct ActivityEngine {
    config: ActivityConfig,
    addresses: Addresses,
    accounts: Vec<Account>,
    nonces: Arc<NonceTracker>,
    run: Arc<RunContext>,
}

fn draw_amount(min: f64, max: f64) -> f64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

fn draw_rep_delay() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(REP_DELAY_MIN_MS..REP_DELAY_MAX_MS))
}

impl ActivityEngine {
    pub fn new(
        config: ActivityConfig,
        addresses: Addresses,
        accounts: Vec<Account>,
        run: Arc<RunContext>,
    ) -> Self {
        Self {
            config,
            addresses,
            accounts,
            nonces: Arc::new(NonceTracker::new()),
            run,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    fn phases(&self) -> Vec<Phase> {
        vec![
            Phase {
                task: Arc::new(DepositUsdc),
                repetitions: self.config.deposit_repetitions,
                min_amount: self.config.min_amount_deposit,
                max_amount: self.config.max_amount_deposit,
            },
            Phase {
                task: Arc::new(LendUsdc),
                repetitions: self.config.lend_repetitions,
                min_amount: self.config.min_amount_lend,
                max_amount: self.config.max_amount_lend,
            },
            Phase {
                task: Arc::new(StakeKld),
                repetitions: self.config.stake_repetitions,
                min_amount: self.config.min_amount_stake,
                max_amount: self.config.max_amount_stake,
            },
        ]
    }

    fn context_for(&self, account: &Account, amount: f64) -> TaskContext {
        TaskContext {
            rpc: Arc::clone(&account.rpc),
            signer: account.signer.clone(),
            addresses: self.addresses,
            nonces: Arc::clone(&self.nonces),
            run: Arc::clone(&self.run),
            amount,
        }
    }

    async fn refresh_account(&mut self, index: usize) {
        wallet::refresh_all(&mut self.accounts[index..=index], &self.addresses).await;
    }

    /// Runs one task repetition, records the outcome, refreshes the
    /// account's balances. A per-action failure never aborts the run.
    async fn run_action(
        &mut self,
        index: usize,
        task: &dyn Task<TaskContext>,
        amount: f64,
        stats: &mut CycleStats,
    ) {
        let label = self.accounts[index].label();
        let ctx = self.context_for(&self.accounts[index], amount);
        match task.run(ctx).await {
            Ok(result) if result.success => stats.success += 1,
            Ok(_) => stats.failed += 1,
            Err(e) => {
                stats.failed += 1;
                error!(
                    target: "activity",
                    "{} failed for {}: {:#}",
                    task.name(),
                    label,
                    e
                );
            }
        }
        self.refresh_account(index).await;
    }

    async fn run_account(&mut self, index: usize, stats: &mut CycleStats) {
        for phase in self.phases() {
            for rep in 1..=phase.repetitions {
                if self.run.is_stopped() {
                    return;
                }
                let amount = draw_amount(phase.min_amount, phase.max_amount);
                info!(
                    target: "activity",
                    "{} ({}/{}) for {}",
                    phase.task.name(),
                    rep,
                    phase.repetitions,
                    self.accounts[index].label()
                );
                self.run_action(index, phase.task.as_ref(), amount, stats)
                    .await;
                if rep < phase.repetitions {
                    self.run.sleep(draw_rep_delay()).await;
                }
            }
            if self.run.is_stopped() {
                return;
            }
            self.run.sleep(SETTLE_DELAY).await;
        }

        if self.run.is_stopped() {
            return;
        }
        // Exactly one faucet claim per account per cycle.
        self.run_action(index, &ClaimFaucet, 0.0, stats).await;
    }

    /// One complete pass over all accounts.
    async fn run_cycle(&mut self) -> CycleStats {
        let mut stats = CycleStats::default();
        let total = self.accounts.len();
        for index in 0..total {
            if self.run.is_stopped() {
                break;
            }
            info!(
                target: "activity",
                "Starting daily activity for {}",
                self.accounts[index].label()
            );
            self.run_account(index, &mut stats).await;
            if self.run.is_stopped() {
                break;
            }
            if index + 1 < total {
                self.run
                    .sleep(Duration::from_millis(self.config.account_delay_ms))
                    .await;
            }
        }
        stats
    }

    /// Runs a single cycle and settles back to `Idle`, draining any
    /// suspended work first when a stop cut the cycle short.
    pub async fn run_once(&mut self) -> Result<CycleStats> {
        self.run.try_begin_run()?;
        let stats = self.run_cycle().await;
        if self.run.is_stopped() {
            self.run.wait_for_drain().await;
        }
        self.run.finish_to_idle();
        info!(
            target: "activity",
            "Cycle finished. Success: {}, Failed: {}",
            stats.success,
            stats.failed
        );
        Ok(stats)
    }

    /// The full loop: run a cycle, then reschedule it after the
    /// configured interval until stopped or the schedule is cancelled.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.run.try_begin_run()?;
            let stats = self.run_cycle().await;

            if self.run.is_stopped() {
                self.run.wait_for_drain().await;
                self.run.finish_to_idle();
                info!(
                    target: "activity",
                    "Activity stopped. Success: {}, Failed: {}",
                    stats.success,
                    stats.failed
                );
                return Ok(());
            }

            let interval = Duration::from_secs(self.config.cycle_interval_hours * 3600);
            let schedule = self.run.finish_to_scheduled();
            info!(
                target: "activity",
                "Cycle complete. Success: {}, Failed: {}. Next cycle in {}",
                stats.success,
                stats.failed,
                format_wait(interval.as_secs())
            );

            tokio::select! {
                _ = schedule.cancelled() => {
                    self.run.finish_to_idle();
                    info!(target: "activity", "Scheduled cycle cancelled.");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}
