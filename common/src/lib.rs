pub mod config;
pub mod error;
pub mod rpc;
pub mod units;

// Re-export the big-number types so downstream crates share one version
pub use primitive_types::{H160, H256, U256};

/// Account address on an EVM chain
pub type Address = H160;

/// Transaction hash as returned by `eth_sendTransaction`
pub type TxHash = H256;

/// Parse a `0x`-prefixed (or bare) 20 bytes hex address
pub fn parse_address(value: &str) -> Result<Address, error::AddressError> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let bytes = hex::decode(stripped)?;
    if bytes.len() != Address::len_bytes() {
        return Err(error::AddressError::InvalidLength(bytes.len()));
    }

    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address = parse_address("0x00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(address, Address::from_low_u64_be(0xff));

        let bare = parse_address("00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(bare, address);
    }

    #[test]
    fn test_parse_address_rejects_bad_input() {
        assert!(matches!(
            parse_address("0x1234"),
            Err(error::AddressError::InvalidLength(2))
        ));
        assert!(matches!(
            parse_address("0xzz000000000000000000000000000000000000ff"),
            Err(error::AddressError::Hex(_))
        ));
    }
}
