use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const JSON_RPC_VERSION: &str = "2.0";

pub type Id = u64;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: Id,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: Id, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION,
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    // `"result": null` is a valid answer, only a missing field is `None`
    #[serde(default, deserialize_with = "deserialize_present")]
    pub result: Option<Value>,
    pub error: Option<RpcErrorObject>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Decode a hex quantity (`"0x1b4"`) that must fit in a u64
pub fn quantity_to_u64(value: &Value) -> Option<u64> {
    let quantity: U256 = serde_json::from_value(value.clone()).ok()?;
    if quantity > U256::from(u64::MAX) {
        return None;
    }
    Some(quantity.low_u64())
}

/// Encode a u64 as a hex quantity, as expected by the eth_* methods
pub fn u64_to_quantity(value: u64) -> String {
    format!("{:#x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let request = RpcRequest::new(7, "evm_increaseTime", json!([3600]));
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "evm_increaseTime",
                "params": [3600]
            })
        );
    }

    #[test]
    fn test_error_response_decoding() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "invalid snapshot id" }
        }))
        .unwrap();

        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, -32000);
        assert_eq!(error.message, "invalid snapshot id");
    }

    #[test]
    fn test_null_result_is_present() {
        let response: RpcResponse =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1, "result": null })).unwrap();
        assert_eq!(response.result, Some(Value::Null));

        let response: RpcResponse =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1 })).unwrap();
        assert!(response.result.is_none());
    }

    #[test]
    fn test_quantities() {
        assert_eq!(quantity_to_u64(&json!("0x64")), Some(100));
        assert_eq!(quantity_to_u64(&json!("0x0")), Some(0));
        assert_eq!(quantity_to_u64(&json!("0x10000000000000000")), None);
        assert_eq!(quantity_to_u64(&json!(12)), None);
        assert_eq!(u64_to_quantity(255), "0xff");
        assert_eq!(u64_to_quantity(0), "0x0");
    }
}
