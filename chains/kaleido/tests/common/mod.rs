// Not every test binary touches every helper here.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
use ethers::utils::id;
use ethers::utils::rlp::Rlp;
use kaleido_project::config::{Addresses, KALEIDO_CHAIN_ID};
use kaleido_project::task::TaskContext;
use kaleido_project::utils::nonce_manager::NonceTracker;
use kaleido_project::utils::rpc::ChainRpc;
use core_logic::RunContext;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const TEST_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

const SELECTOR_LAST_CLAIMED_KLD: [u8; 4] = [0xaf, 0xa4, 0xd6, 0x31];

/// A submitted transaction decoded from its signed RLP form.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub nonce: U256,
    pub to: Address,
    pub data: Vec<u8>,
}

impl SentTx {
    pub fn selector(&self) -> [u8; 4] {
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&self.data[..4]);
        sel
    }
}

/// In-memory chain double. Reads are dispatched on the calldata
/// selector; writes are recorded in submission order and paired with
/// a scripted receipt status (default: success).
pub struct MockRpc {
    native: Mutex<HashMap<Address, U256>>,
    token_balances: Mutex<HashMap<(Address, Address), U256>>,
    allowances: Mutex<HashMap<(Address, Address, Address), U256>>,
    pending: Mutex<HashMap<Address, U256>>,
    cooldown: Mutex<u64>,
    last_claimed_usdc: Mutex<HashMap<Address, u64>>,
    last_claimed_kld: Mutex<HashMap<Address, u64>>,
    sent: Mutex<Vec<Bytes>>,
    statuses: Mutex<VecDeque<u64>>,
    receipts: Mutex<HashMap<H256, u64>>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self {
            native: Mutex::new(HashMap::new()),
            token_balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            cooldown: Mutex::new(86_400),
            last_claimed_usdc: Mutex::new(HashMap::new()),
            last_claimed_kld: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.native.lock().unwrap().insert(owner, amount);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        self.token_balances.lock().unwrap().insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances
            .lock()
            .unwrap()
            .insert((token, owner, spender), amount);
    }

    pub fn set_pending_count(&self, owner: Address, count: U256) {
        self.pending.lock().unwrap().insert(owner, count);
    }

    pub fn set_cooldown(&self, seconds: u64) {
        *self.cooldown.lock().unwrap() = seconds;
    }

    pub fn set_last_claimed_usdc(&self, owner: Address, ts: u64) {
        self.last_claimed_usdc.lock().unwrap().insert(owner, ts);
    }

    pub fn set_last_claimed_kld(&self, owner: Address, ts: u64) {
        self.last_claimed_kld.lock().unwrap().insert(owner, ts);
    }

    /// Scripts the receipt status for the next submission(s); any
    /// unscripted submission succeeds.
    pub fn push_status(&self, status: u64) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// All recorded submissions, decoded from signed legacy RLP.
    pub fn sent(&self) -> Vec<SentTx> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|raw| {
                let (tx, _sig) =
                    TypedTransaction::decode_signed(&Rlp::new(raw.as_ref())).unwrap();
                SentTx {
                    nonce: tx.nonce().copied().unwrap_or_default(),
                    to: tx
                        .to()
                        .and_then(|t| t.as_address())
                        .copied()
                        .unwrap_or_default(),
                    data: tx.data().map(|b| b.to_vec()).unwrap_or_default(),
                }
            })
            .collect()
    }

    fn word_u256(out: U256) -> Bytes {
        let mut word = [0u8; 32];
        out.to_big_endian(&mut word);
        Bytes::from(word.to_vec())
    }

    fn arg_address(data: &[u8], index: usize) -> Address {
        Address::from_slice(&data[4 + 32 * index + 12..4 + 32 * (index + 1)])
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self
            .native
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn pending_transaction_count(&self, address: Address) -> Result<U256> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let data = data.to_vec();
        let selector: [u8; 4] = data[..4].try_into()?;

        let value = if selector == id("balanceOf(address)") {
            let owner = Self::arg_address(&data, 0);
            self.token_balances
                .lock()
                .unwrap()
                .get(&(to, owner))
                .copied()
                .unwrap_or_default()
        } else if selector == id("allowance(address,address)") {
            let owner = Self::arg_address(&data, 0);
            let spender = Self::arg_address(&data, 1);
            self.allowances
                .lock()
                .unwrap()
                .get(&(to, owner, spender))
                .copied()
                .unwrap_or_default()
        } else if selector == id("COOLDOWN()") {
            U256::from(*self.cooldown.lock().unwrap())
        } else if selector == id("lastClaimed(address)") {
            let owner = Self::arg_address(&data, 0);
            U256::from(
                self.last_claimed_usdc
                    .lock()
                    .unwrap()
                    .get(&owner)
                    .copied()
                    .unwrap_or_default(),
            )
        } else if selector == SELECTOR_LAST_CLAIMED_KLD {
            let owner = Self::arg_address(&data, 0);
            U256::from(
                self.last_claimed_kld
                    .lock()
                    .unwrap()
                    .get(&owner)
                    .copied()
                    .unwrap_or_default(),
            )
        } else {
            anyhow::bail!("unexpected call selector {}", hex::encode(selector));
        };

        Ok(Self::word_u256(value))
    }

    async fn gas_price(&self) -> Result<U256> {
        Ok(U256::from(1_000_000_000u64))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len() as u64;
        sent.push(raw);
        let hash = H256::from_low_u64_be(index + 1);
        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(1);
        self.receipts.lock().unwrap().insert(hash, status);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        Ok(self.receipts.lock().unwrap().get(&hash).map(|status| {
            TransactionReceipt {
                transaction_hash: hash,
                status: Some((*status).into()),
                ..Default::default()
            }
        }))
    }
}

pub fn test_signer() -> LocalWallet {
    TEST_KEY
        .parse::<LocalWallet>()
        .unwrap()
        .with_chain_id(KALEIDO_CHAIN_ID)
}

/// Task context wired to a fresh mock chain and run context.
pub fn test_context(rpc: Arc<MockRpc>, amount: f64) -> TaskContext {
    TaskContext {
        rpc,
        signer: test_signer(),
        addresses: Addresses::kaleido().unwrap(),
        nonces: Arc::new(NonceTracker::new()),
        run: Arc::new(RunContext::new()),
        amount,
    }
}
