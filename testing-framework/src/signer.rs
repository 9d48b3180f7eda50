use devnet_common::{Address, U256};
use serde::{Deserialize, Serialize};

/// Account the node can sign for.
///
/// No key material lives here: the node must already control the address,
/// either as one of its unlocked dev accounts or through impersonation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signer {
    address: Address,
}

impl Signer {
    /// Handle for `address`
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Address transactions are sent from
    pub fn address(&self) -> Address {
        self.address
    }

    /// Plain value transfer from this signer
    pub fn transfer(&self, to: Address, value: U256) -> TransactionRequest {
        TransactionRequest {
            from: self.address,
            to: Some(to),
            value: Some(value),
            nonce: None,
            gas: None,
        }
    }
}

impl From<Address> for Signer {
    fn from(address: Address) -> Self {
        Self::new(address)
    }
}

/// Parameters of `eth_sendTransaction` / `eth_estimateGas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Sender, must be controlled by the node
    pub from: Address,
    /// Recipient, `None` for contract creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Value in base units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Explicit nonce, the node picks the next one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
}

impl TransactionRequest {
    /// Pin the transaction to `nonce`
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(U256::from(nonce));
        self
    }

    /// Set an explicit gas limit
    pub fn with_gas(mut self, gas: U256) -> Self {
        self.gas = Some(gas);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transfer_request_encoding() {
        let signer = Signer::new(Address::from_low_u64_be(1));
        let request = signer
            .transfer(Address::from_low_u64_be(2), U256::from(1_000u64))
            .with_nonce(5);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "from": "0x0000000000000000000000000000000000000001",
                "to": "0x0000000000000000000000000000000000000002",
                "value": "0x3e8",
                "nonce": "0x5"
            })
        );
    }
}
