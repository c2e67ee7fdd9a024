use anyhow::Result;
use core_logic::ActivityError;
use ethers::types::Address;

/// Kaleido testnet endpoint and chain id. The bot is hard-wired to
/// this one chain; there is no multi-chain abstraction.
pub const KALEIDO_RPC_URL: &str =
    "https://11124.rpc.thirdweb.com/1f9e649fdf16709afd04bb52b54d1964";
pub const KALEIDO_CHAIN_ID: u64 = 11124;

pub const KLD_TOKEN_ADDRESS: &str = "0x0c61dbCF1e8DdFF0E237a256257260fDF6934505";
pub const USDC_TOKEN_ADDRESS: &str = "0x572f4901f03055ffC1D936a60Ccc3CbF13911BE3";
pub const DEPOSIT_ROUTER_ADDRESS: &str = "0x2aC60481a9EA2e67D80CdfBF587c63c88A5874ac";
pub const STAKE_ROUTER_ADDRESS: &str = "0xb6fb7fd04eCF2723f8a5659134a145Bd7fE68748";
pub const FAUCET_ROUTER_ADDRESS: &str = "0xC99eddf1f7C9250728A47978732928aE158396E7";
pub const STAKE_REFERRAL_ADDRESS: &str = "0x3fb832980638036e81231931cbd48f95a7746d41";

pub const CONFIG_FILE: &str = "config.json";

fn parse_address(raw: &str) -> Result<Address> {
    raw.parse::<Address>()
        .map_err(|_| {
            ActivityError::InvalidAddress {
                address: raw.to_string(),
            }
            .into()
        })
}

/// The typed contract surface every task works against: two tokens,
/// three routers, the stake referral, and the chain id.
#[derive(Debug, Clone, Copy)]
pub struct Addresses {
    pub usdc: Address,
    pub kld: Address,
    pub deposit_router: Address,
    pub stake_router: Address,
    pub faucet_router: Address,
    pub stake_referral: Address,
    pub chain_id: u64,
}

impl Addresses {
    pub fn kaleido() -> Result<Self> {
        Ok(Self {
            usdc: parse_address(USDC_TOKEN_ADDRESS)?,
            kld: parse_address(KLD_TOKEN_ADDRESS)?,
            deposit_router: parse_address(DEPOSIT_ROUTER_ADDRESS)?,
            stake_router: parse_address(STAKE_ROUTER_ADDRESS)?,
            faucet_router: parse_address(FAUCET_ROUTER_ADDRESS)?,
            stake_referral: parse_address(STAKE_REFERRAL_ADDRESS)?,
            chain_id: KALEIDO_CHAIN_ID,
        })
    }
}
