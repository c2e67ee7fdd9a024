mod common;

use common::{test_signer, MockRpc};
use core_logic::{ActivityConfig, RunContext, RunState};
use ethers::signers::Signer;
use ethers::types::U256;
use kaleido_project::activity::ActivityEngine;
use kaleido_project::config::Addresses;
use kaleido_project::utils::rpc::ChainRpc;
use kaleido_project::wallet::Account;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SELECTOR_DEPOSIT: [u8; 4] = [0xa5, 0xd5, 0xdb, 0x0c];

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn cycle_config(deposit_repetitions: u32) -> ActivityConfig {
    ActivityConfig {
        deposit_repetitions,
        min_amount_deposit: 0.1,
        max_amount_deposit: 0.1,
        lend_repetitions: 1,
        min_amount_lend: 1_000_000.0,
        max_amount_lend: 1_000_000.0,
        stake_repetitions: 1,
        min_amount_stake: 1_000_000.0,
        max_amount_stake: 1_000_000.0,
        action_delay_ms: 1_000,
        account_delay_ms: 1_000,
        cycle_interval_hours: 1,
    }
}

/// One account, large enough USDC balance and allowance for deposits
/// only; lend and stake amounts exceed the balance, and the faucet is
/// inside its cooldown, so deposits are the only submissions.
fn funded_account(rpc: &Arc<MockRpc>, addrs: &Addresses) -> Account {
    let signer = test_signer();
    let owner = signer.address();

    rpc.set_token_balance(addrs.usdc, owner, U256::from(1_000_000u64));
    rpc.set_allowance(
        addrs.usdc,
        owner,
        addrs.deposit_router,
        U256::from(1_000_000_000_000u64),
    );
    rpc.set_last_claimed_usdc(owner, unix_now());
    rpc.set_last_claimed_kld(owner, unix_now());

    Account::with_rpc(0, signer, None, Arc::clone(rpc) as Arc<dyn ChainRpc>)
}

#[tokio::test(start_paused = true)]
async fn two_deposit_repetitions_yield_exactly_two_submissions() {
    let rpc = Arc::new(MockRpc::new());
    let addrs = Addresses::kaleido().unwrap();
    let account = funded_account(&rpc, &addrs);

    let run = Arc::new(RunContext::new());
    let mut engine = ActivityEngine::new(cycle_config(2), addrs, vec![account], Arc::clone(&run));

    let started = tokio::time::Instant::now();
    let stats = engine.run_once().await.unwrap();

    let sent = rpc.sent();
    assert_eq!(sent.len(), 2, "deposits are the only submissions");
    for tx in &sent {
        assert_eq!(tx.to, addrs.deposit_router);
        assert_eq!(tx.selector(), SELECTOR_DEPOSIT);
        // Amount word: 0.1 USDC in base units.
        assert_eq!(
            U256::from_big_endian(&tx.data[4 + 32..4 + 64]),
            U256::from(100_000u64)
        );
    }
    assert_eq!(sent[0].nonce, U256::zero());
    assert_eq!(sent[1].nonce, U256::one());

    // Deposits succeed; lend, stake and faucet are recorded failures.
    assert_eq!(stats.success, 2);
    assert_eq!(stats.failed, 3);

    // At least the one inter-repetition delay plus the settle delays.
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(run.state(), RunState::Idle);
}

#[tokio::test(start_paused = true)]
async fn stop_request_halts_cycle_and_drains_in_flight_work() {
    let rpc = Arc::new(MockRpc::new());
    let addrs = Addresses::kaleido().unwrap();
    let account = funded_account(&rpc, &addrs);

    let run = Arc::new(RunContext::new());
    let mut engine = ActivityEngine::new(cycle_config(50), addrs, vec![account], Arc::clone(&run));

    let handle = tokio::spawn(async move { engine.run_once().await });

    // Let a couple of repetitions land, then stop mid-cycle.
    tokio::time::sleep(Duration::from_secs(25)).await;
    run.request_stop();

    let stats = handle.await.unwrap().unwrap();
    assert_eq!(run.state(), RunState::Idle);
    assert_eq!(run.active_ops(), 0);

    let sent = rpc.sent_count();
    assert!(sent >= 1, "expected at least one submission before the stop");
    assert!(sent < 50, "stop must cut the cycle short");
    assert_eq!(stats.success as usize, sent);
}
