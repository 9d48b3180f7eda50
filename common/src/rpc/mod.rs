pub mod client;

mod error;
mod types;

pub use client::{ClientConfig, HttpJsonRpcClient};
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;

/// Transport used to reach an EVM node.
///
/// Implementations forward a single JSON-RPC call and return the raw
/// `result` value, or the error the node (or the transport) surfaced.
/// Nothing is retried at this level.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Call `method` with positional `params` (a JSON array or `null`)
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}
