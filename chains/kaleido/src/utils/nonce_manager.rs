use anyhow::Result;
use core_logic::{ActivityError, RunContext};
use ethers::types::{Address, U256};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Hands out strictly increasing nonces per address across concurrent
/// submissions, reconciling with the node's pending count so externally
/// mined transactions advance the floor.
pub struct NonceTracker {
    last_assigned: Mutex<HashMap<Address, U256>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self {
            last_assigned: Mutex::new(HashMap::new()),
        }
    }

    /// max(pending count, last assigned + 1). A fresh address just
    /// takes the chain-reported pending count.
    pub async fn next_nonce(
        &self,
        rpc: &dyn crate::utils::rpc::ChainRpc,
        run: &RunContext,
        address: Address,
    ) -> Result<U256> {
        if run.is_stopped() {
            return Err(ActivityError::Cancelled.into());
        }

        let pending = rpc.pending_transaction_count(address).await?;
        let mut map = self.last_assigned.lock().await;
        let next = match map.get(&address) {
            Some(last) => pending.max(*last + 1),
            None => pending,
        };
        map.insert(address, next);
        debug!("Assigned nonce {} to {:?}", next, address);
        Ok(next)
    }
}

impl Default for NonceTracker {
    fn default() -> Self {
        Self::new()
    }
}
