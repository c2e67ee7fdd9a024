pub mod abi;
pub mod nonce_manager;
pub mod rpc;
pub mod token;

use ethers::types::{Address, H256};

/// `0x1234...abcd` form for log lines.
pub fn short_address(address: &Address) -> String {
    let full = format!("{:?}", address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub fn short_hash(hash: &H256) -> String {
    let full = format!("{:?}", hash);
    format!("{}...{}", &full[..10], &full[full.len() - 6..])
}

/// Human phrasing for cooldown and cycle waits.
pub fn format_wait(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} hour{}", hours, if hours == 1 { "" } else { "s" }));
    }
    if minutes > 0 {
        parts.push(format!(
            "{} minute{}",
            minutes,
            if minutes == 1 { "" } else { "s" }
        ));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!(
            "{} second{}",
            seconds,
            if seconds == 1 { "" } else { "s" }
        ));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_keeps_ends() {
        let addr: Address = "0x572f4901f03055ffC1D936a60Ccc3CbF13911BE3"
            .parse()
            .unwrap();
        assert_eq!(short_address(&addr), "0x572f...1be3");
    }

    #[test]
    fn format_wait_phrasing() {
        assert_eq!(format_wait(0), "0 seconds");
        assert_eq!(format_wait(1), "1 second");
        assert_eq!(format_wait(61), "1 minute 1 second");
        assert_eq!(format_wait(3600), "1 hour");
        assert_eq!(format_wait(7325), "2 hours 2 minutes 5 seconds");
    }
}
