use crate::utils::abi::{decode_u256, encode_call, format_amount, pad_address, pad_u256};
use crate::utils::rpc::ChainRpc;
use anyhow::Result;
use core_logic::ActivityError;
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;

pub const USDC_DECIMALS: u32 = 6;
pub const KLD_DECIMALS: u32 = 18;

/// Approvals are a fixed-shape ERC-20 write, so a flat limit is fine.
pub const GAS_LIMIT_APPROVE: u64 = 120_000;

pub async fn balance_of(rpc: &dyn ChainRpc, token: Address, owner: Address) -> Result<U256> {
    let data = encode_call(id("balanceOf(address)"), &[pad_address(owner)]);
    let out = rpc.call(token, data).await?;
    decode_u256(&out)
}

pub async fn allowance(
    rpc: &dyn ChainRpc,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = encode_call(
        id("allowance(address,address)"),
        &[pad_address(owner), pad_address(spender)],
    );
    let out = rpc.call(token, data).await?;
    decode_u256(&out)
}

pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    encode_call(
        id("approve(address,uint256)"),
        &[pad_address(spender), pad_u256(amount)],
    )
}

/// Balance precondition check before any token-spending write. The
/// error carries display amounts, not base units.
pub async fn require_balance(
    rpc: &dyn ChainRpc,
    token: Address,
    owner: Address,
    required: U256,
    symbol: &str,
    decimals: u32,
) -> Result<()> {
    let available = balance_of(rpc, token, owner).await?;
    if available < required {
        return Err(ActivityError::InsufficientBalance {
            symbol: symbol.to_string(),
            required: format_amount(required, decimals, 4),
            available: format_amount(available, decimals, 4),
        }
        .into());
    }
    Ok(())
}
