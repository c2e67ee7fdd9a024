use anyhow::Result;
use ethers::types::{Address, Bytes, U256};

pub type Selector = [u8; 4];

/// Left-pads an address into a 32-byte ABI word.
pub fn pad_address(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Big-endian 32-byte ABI word for an integer argument.
pub fn pad_u256(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Fixed 4-byte selector followed by the 32-byte-padded arguments.
pub fn encode_call(selector: Selector, words: &[[u8; 32]]) -> Bytes {
    let mut out = Vec::with_capacity(4 + words.len() * 32);
    out.extend_from_slice(&selector);
    for word in words {
        out.extend_from_slice(word);
    }
    Bytes::from(out)
}

/// Reads the first 32-byte word of raw call output as an integer.
pub fn decode_u256(raw: &[u8]) -> Result<U256> {
    if raw.len() < 32 {
        anyhow::bail!("ABI word too short: {} bytes", raw.len());
    }
    Ok(U256::from_big_endian(&raw[..32]))
}

/// Converts a user-facing amount to base units. Amounts are drawn
/// with four fractional digits, matching the configured ranges.
pub fn parse_amount(amount: f64, decimals: u32) -> Result<U256> {
    let rendered = format!("{:.4}", amount);
    Ok(ethers::utils::parse_units(rendered, decimals)?.into())
}

/// Base units back to a display string with the given precision.
pub fn format_amount(value: U256, decimals: u32, precision: usize) -> String {
    let rendered = ethers::utils::format_units(value, decimals)
        .unwrap_or_else(|_| value.to_string());
    match rendered.parse::<f64>() {
        Ok(v) => format!("{:.*}", precision, v),
        Err(_) => rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_call_concatenates_selector_and_words() {
        let token: Address = "0x572f4901f03055ffC1D936a60Ccc3CbF13911BE3"
            .parse()
            .unwrap();
        let amount = U256::from(1_000_000u64); // 1 USDC in 6 decimals

        let data = encode_call(
            [0xa5, 0xd5, 0xdb, 0x0c],
            &[pad_address(token), pad_u256(amount)],
        );

        let expected = format!(
            "a5d5db0c{}{}",
            "000000000000000000000000572f4901f03055ffc1d936a60ccc3cbf13911be3",
            "00000000000000000000000000000000000000000000000000000000000f4240",
        );
        assert_eq!(hex::encode(&data), expected);
    }

    #[test]
    fn decode_u256_reads_first_word() {
        let mut raw = [0u8; 32];
        raw[31] = 0x2a;
        assert_eq!(decode_u256(&raw).unwrap(), U256::from(42u64));
        assert!(decode_u256(&raw[..16]).is_err());
    }

    #[test]
    fn parse_amount_uses_four_fractional_digits() {
        assert_eq!(parse_amount(0.1, 6).unwrap(), U256::from(100_000u64));
        assert_eq!(
            parse_amount(12.3456, 18).unwrap(),
            U256::from(12_345_600_000_000_000_000u128)
        );
    }

    #[test]
    fn format_amount_rounds_for_display() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6, 2), "1.50");
    }
}
