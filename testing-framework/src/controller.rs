//! Chain time and state controller
//!
//! Every method maps onto one or more JSON-RPC calls against the node. No
//! state is cached locally: block height, chain time and snapshots all live
//! in the node, so two controllers over the same node see the same chain.

use std::{fmt, sync::Arc};

use devnet_common::{
    config::BLOCKS_PER_HOUR,
    rpc::{quantity_to_u64, ClientConfig, HttpJsonRpcClient, NodeRpc},
    Address, TxHash, U256,
};
use futures::future::try_join_all;
use log::{debug, trace, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::ChainError,
    signer::{Signer, TransactionRequest},
    time_input::TimeInput,
};

pub(crate) const EVM_MINE: &str = "evm_mine";
pub(crate) const EVM_INCREASE_TIME: &str = "evm_increaseTime";
pub(crate) const EVM_SNAPSHOT: &str = "evm_snapshot";
pub(crate) const EVM_REVERT: &str = "evm_revert";
const IMPERSONATE_ACCOUNT: &str = "hardhat_impersonateAccount";
const STOP_IMPERSONATING_ACCOUNT: &str = "hardhat_stopImpersonatingAccount";
const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const ETH_GET_BALANCE: &str = "eth_getBalance";
const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
const ETH_ESTIMATE_GAS: &str = "eth_estimateGas";

/// Tunables of the controller
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Average block rate assumed by `mine_2_hours` / `mine_24_hours`
    pub blocks_per_hour: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            blocks_per_hour: BLOCKS_PER_HOUR,
        }
    }
}

/// Opaque rollback point returned by the node.
///
/// Consumed by a revert. Nothing here checks whether the node still knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Value);

impl SnapshotId {
    /// Wrap an identifier obtained elsewhere
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Raw value, as the node returned it
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(id) => write!(f, "{}", id),
            other => write!(f, "{}", other),
        }
    }
}

/// Convenience operations over the RPC surface of an EVM test node
#[derive(Clone)]
pub struct ChainController {
    node: Arc<dyn NodeRpc>,
    config: ControllerConfig,
}

impl ChainController {
    /// Controller over an existing transport
    pub fn new(node: Arc<dyn NodeRpc>) -> Self {
        Self::with_config(node, ControllerConfig::default())
    }

    /// Controller over an existing transport, with custom tunables
    pub fn with_config(node: Arc<dyn NodeRpc>, config: ControllerConfig) -> Self {
        Self { node, config }
    }

    /// Controller talking JSON-RPC over HTTP to `config.endpoint`
    pub fn connect(config: &ClientConfig) -> Result<Self, ChainError> {
        let client = HttpJsonRpcClient::with_config(config.clone())?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Underlying transport
    pub fn node(&self) -> &Arc<dyn NodeRpc> {
        &self.node
    }

    /// Active tunables
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    async fn request(&self, method: &'static str, params: Value) -> Result<Value, ChainError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("{} {}", method, params);
        }
        Ok(self.node.call(method, params).await?)
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, ChainError> {
        let value = self.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| ChainError::unexpected(method, e.to_string()))
    }

    // ========================================================================
    // Blocks and time
    // ========================================================================

    /// Timestamp of the latest block, in unix seconds
    pub async fn current_time(&self) -> Result<u64, ChainError> {
        let block = self
            .request(ETH_GET_BLOCK_BY_NUMBER, json!(["latest", false]))
            .await?;

        block
            .get("timestamp")
            .and_then(quantity_to_u64)
            .ok_or_else(|| ChainError::unexpected(ETH_GET_BLOCK_BY_NUMBER, "missing block timestamp"))
    }

    /// Height of the latest block
    pub async fn current_block(&self) -> Result<u64, ChainError> {
        let height = self.request(ETH_BLOCK_NUMBER, json!([])).await?;
        quantity_to_u64(&height)
            .ok_or_else(|| ChainError::unexpected(ETH_BLOCK_NUMBER, format!("invalid height {}", height)))
    }

    // Single evm_mine, without reading the height back
    pub(crate) async fn mine(&self) -> Result<(), ChainError> {
        self.request(EVM_MINE, json!([])).await?;
        Ok(())
    }

    /// Mine exactly one block and return the new height
    pub async fn mine_block(&self) -> Result<u64, ChainError> {
        self.mine().await?;
        let height = self.current_block().await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("Mined block {}", height);
        }
        Ok(height)
    }

    /// Issue `count` mine requests.
    ///
    /// With `synchronous`, every request is sent concurrently and awaited
    /// before the height is read, so the result is `before + count`. The
    /// first failing request fails the whole call; the others are not
    /// cancelled.
    ///
    /// Without it, requests are spawned on the tokio runtime and not waited
    /// for: the returned height may not include them yet. Failures of those
    /// requests are only logged.
    pub async fn mine_block_bulk(&self, count: u64, synchronous: bool) -> Result<u64, ChainError> {
        if synchronous {
            if count > 0 {
                try_join_all((0..count).map(|_| self.node.call(EVM_MINE, json!([])))).await?;
            }
        } else {
            for _ in 0..count {
                let node = Arc::clone(&self.node);
                tokio::spawn(async move {
                    if let Err(e) = node.call(EVM_MINE, json!([])).await {
                        warn!("Background evm_mine failed: {}", e);
                    }
                });
            }
        }

        let height = self.current_block().await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Bulk mined {} blocks ({}), height is now {}",
                count,
                if synchronous { "sync" } else { "async" },
                height
            );
        }
        Ok(height)
    }

    // Blocks produced in `hours` at the configured rate
    fn blocks_for_hours(&self, hours: u64) -> Result<u64, ChainError> {
        let blocks_per_hour = self.config.blocks_per_hour;
        blocks_per_hour
            .checked_mul(hours)
            .ok_or(ChainError::BlockCountOverflow {
                blocks_per_hour,
                hours,
            })
    }

    /// Mine roughly two hours worth of blocks
    pub async fn mine_2_hours(&self, synchronous: bool) -> Result<u64, ChainError> {
        self.mine_block_bulk(self.blocks_for_hours(2)?, synchronous)
            .await
    }

    /// Mine roughly a day worth of blocks
    pub async fn mine_24_hours(&self, synchronous: bool) -> Result<u64, ChainError> {
        self.mine_block_bulk(self.blocks_for_hours(24)?, synchronous)
            .await
    }

    /// Mine until the chain reaches `target`. Nothing happens when it is
    /// already there or beyond.
    pub async fn mine_to(&self, target: u64, synchronous: bool) -> Result<u64, ChainError> {
        let current = self.current_block().await?;
        if current >= target {
            return Ok(current);
        }

        self.mine_block_bulk(target - current, synchronous).await
    }

    pub(crate) async fn increase_time(&self, seconds: u64) -> Result<(), ChainError> {
        self.request(EVM_INCREASE_TIME, json!([seconds])).await?;
        Ok(())
    }

    /// Move chain time forward by `seconds`, then mine a block so the new
    /// time is visible. Returns the new height.
    pub async fn fast_forward<T: Into<TimeInput>>(&self, seconds: T) -> Result<u64, ChainError> {
        let seconds = seconds.into().to_seconds()?;
        self.increase_time(seconds).await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("Increased chain time by {}s", seconds);
        }
        self.mine_block().await
    }

    /// Move chain time forward up to the unix time `target`.
    ///
    /// Fails with [`ChainError::InvalidTimeTarget`] when `target` is before
    /// the latest block timestamp.
    pub async fn fast_forward_to<T: Into<TimeInput>>(&self, target: T) -> Result<u64, ChainError> {
        let target = target.into().to_seconds()?;
        let now = self.current_time().await?;
        if target < now {
            return Err(ChainError::InvalidTimeTarget { target, now });
        }

        self.fast_forward(target - now).await
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub(crate) async fn snapshot(&self) -> Result<SnapshotId, ChainError> {
        let id = self.request(EVM_SNAPSHOT, json!([])).await?;
        Ok(SnapshotId(id))
    }

    pub(crate) async fn revert(&self, id: &SnapshotId) -> Result<(), ChainError> {
        let reverted = self.request(EVM_REVERT, json!([id])).await?;
        // Some nodes answer `false` instead of an error for unknown ids
        if reverted == Value::Bool(false) {
            warn!("Node reported that snapshot {} was not reverted", id);
        }
        Ok(())
    }

    /// Record a rollback point, then mine one block
    pub async fn take_snapshot(&self) -> Result<SnapshotId, ChainError> {
        let id = self.snapshot().await?;
        self.mine_block().await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("Took snapshot {}", id);
        }
        Ok(id)
    }

    /// Restore the chain to snapshot `id`, mine one block and return the
    /// resulting height. Errors for unknown or consumed ids come from the
    /// node untouched.
    pub async fn revert_snapshot(&self, id: &SnapshotId) -> Result<u64, ChainError> {
        self.revert(id).await?;
        let height = self.mine_block().await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("Reverted to snapshot {}, height is now {}", id, height);
        }
        Ok(height)
    }

    // ========================================================================
    // Accounts and transactions
    // ========================================================================

    /// Let the node send transactions from each of `accounts` without keys
    pub async fn impersonate(&self, accounts: &[Address]) -> Result<(), ChainError> {
        for account in accounts {
            self.request(IMPERSONATE_ACCOUNT, json!([account])).await?;
            if log::log_enabled!(log::Level::Debug) {
                debug!("Impersonating {:?}", account);
            }
        }
        Ok(())
    }

    /// Undo [`ChainController::impersonate`]
    pub async fn stop_impersonating(&self, accounts: &[Address]) -> Result<(), ChainError> {
        for account in accounts {
            self.request(STOP_IMPERSONATING_ACCOUNT, json!([account])).await?;
        }
        Ok(())
    }

    /// Native currency balance of `address` at the latest block
    pub async fn balance(&self, address: &Address) -> Result<U256, ChainError> {
        self.request_as(ETH_GET_BALANCE, json!([address, "latest"]))
            .await
    }

    /// Submit a transaction signed by the node, return its hash
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash, ChainError> {
        let hash: TxHash = self
            .request_as(ETH_SEND_TRANSACTION, json!([request]))
            .await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("Sent transaction {:?} from {:?}", hash, request.from);
        }
        Ok(hash)
    }

    /// Transfer `amount` base units from `signer` to `to`
    pub async fn send_eth(
        &self,
        signer: &Signer,
        to: &Address,
        amount: U256,
    ) -> Result<TxHash, ChainError> {
        self.send_transaction(&signer.transfer(*to, amount)).await
    }

    /// Gas the node expects `request` to use
    pub async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, ChainError> {
        self.request_as(ETH_ESTIMATE_GAS, json!([request])).await
    }

    /// Replace whatever is pending at `nonce` with a zero-value self-transfer
    pub async fn cancel_tx(&self, signer: &Signer, nonce: u64) -> Result<TxHash, ChainError> {
        let request = signer
            .transfer(signer.address(), U256::zero())
            .with_nonce(nonce);
        if log::log_enabled!(log::Level::Debug) {
            debug!("Cancelling nonce {} of {:?}", nonce, signer.address());
        }
        self.send_transaction(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_node::InMemoryNode;

    fn controller(node: InMemoryNode) -> ChainController {
        ChainController::new(Arc::new(node))
    }

    #[tokio::test]
    async fn test_current_block_and_time() {
        let chain = controller(InMemoryNode::new().with_block(42).with_timestamp(1_000));
        assert_eq!(chain.current_block().await.unwrap(), 42);
        assert_eq!(chain.current_time().await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn test_mine_block_returns_new_height() {
        let chain = controller(InMemoryNode::new().with_block(7));
        assert_eq!(chain.mine_block().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_blocks_per_hour_is_configurable() {
        let node = Arc::new(InMemoryNode::new());
        let chain = ChainController::with_config(
            node.clone(),
            ControllerConfig { blocks_per_hour: 3 },
        );

        assert_eq!(chain.mine_2_hours(true).await.unwrap(), 6);
        assert_eq!(chain.mine_24_hours(true).await.unwrap(), 78);
    }

    #[tokio::test]
    async fn test_block_count_overflow_is_an_error() {
        let node = Arc::new(InMemoryNode::new());
        let chain = ChainController::with_config(
            node.clone(),
            ControllerConfig {
                blocks_per_hour: 1 << 63,
            },
        );

        assert!(matches!(
            chain.mine_24_hours(true).await,
            Err(ChainError::BlockCountOverflow { hours: 24, .. })
        ));
        assert!(matches!(
            chain.mine_2_hours(false).await,
            Err(ChainError::BlockCountOverflow { hours: 2, .. })
        ));
        assert_eq!(node.request_count(), 0);
    }

    #[tokio::test]
    async fn test_revert_answered_false_still_mines() {
        let chain = controller(InMemoryNode::new().with_block(20).with_lenient_revert());

        let height = chain
            .revert_snapshot(&SnapshotId::new(json!("0x63")))
            .await
            .unwrap();
        assert_eq!(height, 21);
    }

    #[tokio::test]
    async fn test_fast_forward_overflow_leaves_chain_usable() {
        let chain = controller(InMemoryNode::new().with_block(3));

        let error = chain.fast_forward(u64::MAX).await.unwrap_err();
        assert_eq!(error_code(&error), Some(-32602));
        assert_eq!(chain.current_block().await.unwrap(), 3);

        chain.fast_forward(u64::MAX / 2).await.unwrap();
        assert!(chain.fast_forward(u64::MAX / 2).await.is_err());
        assert_eq!(chain.mine_block().await.unwrap(), 5);
    }

    fn error_code(error: &ChainError) -> Option<i64> {
        match error {
            ChainError::Rpc(e) => e.code(),
            _ => None,
        }
    }

    #[test]
    fn test_default_config() {
        assert_eq!(ControllerConfig::default().blocks_per_hour, 1800);
        let config: ControllerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.blocks_per_hour, 1800);
    }

    #[test]
    fn test_snapshot_id_display() {
        assert_eq!(SnapshotId::new(json!("0x1")).to_string(), "0x1");
        assert_eq!(SnapshotId::new(json!(3)).to_string(), "3");
    }
}
