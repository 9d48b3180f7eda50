//! InMemoryNode - hardhat-like dev node for tests
//!
//! Answers the subset of JSON-RPC methods the controller uses, with the
//! semantics of a local test node:
//!
//! - `evm_mine` appends a block whose timestamp is the previous one plus the
//!   pending time increase, or plus one second when there is none
//! - `evm_snapshot` returns incrementing `0x` ids; `evm_revert` restores the
//!   state and drops that snapshot together with every later one. Unknown ids
//!   are an error, or `false` once [`InMemoryNode::with_lenient_revert`] is set
//! - time increases and balances that would overflow are rejected
//! - transactions are mined immediately (automine) and must come from an
//!   unlocked or impersonated account
//!
//! Failures can be injected per method to exercise error propagation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use devnet_common::{
    rpc::{quantity_to_u64, u64_to_quantity, NodeRpc, RpcError},
    Address, TxHash, U256,
};
use log::trace;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::signer::TransactionRequest;

// Gas used by a plain value transfer
const TRANSFER_GAS: u64 = 21_000;

// JSON-RPC error codes answered by the node
const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;
const INTERNAL_ERROR: i64 = -32603;
const SERVER_ERROR: i64 = -32000;

const DEFAULT_GENESIS_TIMESTAMP: u64 = 1_700_000_000;

// Everything a snapshot captures
#[derive(Debug, Clone, Default)]
struct ChainState {
    height: u64,
    timestamp: u64,
    pending_time_increase: u64,
    time_offset: u64,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    transaction_count: u64,
}

impl ChainState {
    fn mine(&mut self) -> Result<(), RpcError> {
        let step = self.pending_time_increase.max(1);
        let height = self
            .height
            .checked_add(1)
            .ok_or_else(|| server_error("Block number overflow".to_string()))?;
        let timestamp = self
            .timestamp
            .checked_add(step)
            .ok_or_else(|| server_error(format!("Block timestamp overflow at {}", self.timestamp)))?;

        self.height = height;
        self.timestamp = timestamp;
        self.pending_time_increase = 0;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NodeState {
    chain: ChainState,
    snapshots: Vec<(u64, ChainState)>,
    next_snapshot_id: u64,
    unlocked: HashSet<Address>,
    impersonated: HashSet<Address>,
    failing_methods: HashSet<String>,
    lenient_revert: bool,
    request_count: u64,
}

/// In-process EVM test node
#[derive(Debug)]
pub struct InMemoryNode {
    state: Mutex<NodeState>,
}

impl Default for InMemoryNode {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNode {
    /// Node at block 0 with a fixed genesis timestamp and no accounts
    pub fn new() -> Self {
        let state = NodeState {
            chain: ChainState {
                timestamp: DEFAULT_GENESIS_TIMESTAMP,
                ..Default::default()
            },
            next_snapshot_id: 1,
            ..Default::default()
        };

        Self {
            state: Mutex::new(state),
        }
    }

    /// Start at `height`
    pub fn with_block(self, height: u64) -> Self {
        self.state.lock().chain.height = height;
        self
    }

    /// Latest block timestamp, in unix seconds
    pub fn with_timestamp(self, timestamp: u64) -> Self {
        self.state.lock().chain.timestamp = timestamp;
        self
    }

    /// Credit `address` with `balance` base units
    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.state.lock().chain.balances.insert(address, balance);
        self
    }

    /// Dev account the node signs for without impersonation
    pub fn with_unlocked_account(self, address: Address, balance: U256) -> Self {
        self.state.lock().unlocked.insert(address);
        self.with_balance(address, balance)
    }

    /// Answer `false` instead of an error when reverting an unknown snapshot,
    /// like hardhat and anvil do
    pub fn with_lenient_revert(self) -> Self {
        self.state.lock().lenient_revert = true;
        self
    }

    /// Make every subsequent call to `method` fail with an internal error
    pub fn fail_method(&self, method: &str) {
        self.state.lock().failing_methods.insert(method.to_string());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.state.lock().failing_methods.clear();
    }

    /// Number of calls received, failed ones included
    pub fn request_count(&self) -> u64 {
        self.state.lock().request_count
    }

    /// Whether the node currently lets `address` send without a key
    pub fn is_impersonating(&self, address: &Address) -> bool {
        self.state.lock().impersonated.contains(address)
    }

    /// Next nonce of `address`
    pub fn nonce(&self, address: &Address) -> u64 {
        self.state
            .lock()
            .chain
            .nonces
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Total time added through `evm_increaseTime`, in seconds
    pub fn time_offset(&self) -> u64 {
        self.state.lock().chain.time_offset
    }

    fn dispatch(state: &mut NodeState, method: &str, params: &Value) -> Result<Value, RpcError> {
        match method {
            "eth_blockNumber" => Ok(json!(u64_to_quantity(state.chain.height))),
            "eth_getBlockByNumber" => Ok(json!({
                "number": u64_to_quantity(state.chain.height),
                "timestamp": u64_to_quantity(state.chain.timestamp),
            })),
            "evm_mine" => {
                state.chain.mine()?;
                Ok(json!("0x0"))
            }
            "evm_increaseTime" => {
                let seconds = param(params, 0)
                    .and_then(|value| value.as_u64().or_else(|| quantity_to_u64(value)))
                    .ok_or_else(|| invalid_params("expected a number of seconds"))?;
                let chain = &mut state.chain;
                let pending = chain
                    .pending_time_increase
                    .checked_add(seconds)
                    .filter(|pending| chain.timestamp.checked_add(*pending).is_some())
                    .ok_or_else(|| invalid_params("time increase overflows the block timestamp"))?;
                let offset = chain
                    .time_offset
                    .checked_add(seconds)
                    .ok_or_else(|| invalid_params("time offset overflow"))?;

                chain.pending_time_increase = pending;
                chain.time_offset = offset;
                Ok(json!(offset.to_string()))
            }
            "evm_snapshot" => {
                let id = state.next_snapshot_id;
                state.next_snapshot_id += 1;
                state.snapshots.push((id, state.chain.clone()));
                Ok(json!(u64_to_quantity(id)))
            }
            "evm_revert" => {
                let id = param(params, 0)
                    .and_then(quantity_to_u64)
                    .ok_or_else(|| invalid_params("expected a snapshot id"))?;
                let index = match state
                    .snapshots
                    .iter()
                    .position(|(snapshot_id, _)| *snapshot_id == id)
                {
                    Some(index) => index,
                    None if state.lenient_revert => return Ok(json!(false)),
                    None => {
                        return Err(server_error(format!(
                            "Invalid snapshot id {}",
                            u64_to_quantity(id)
                        )))
                    }
                };

                let (_, chain) = state.snapshots[index].clone();
                state.snapshots.truncate(index);
                state.chain = chain;
                Ok(json!(true))
            }
            "hardhat_impersonateAccount" => {
                let address: Address = parse_param(params, 0)?;
                state.impersonated.insert(address);
                Ok(json!(true))
            }
            "hardhat_stopImpersonatingAccount" => {
                let address: Address = parse_param(params, 0)?;
                Ok(json!(state.impersonated.remove(&address)))
            }
            "eth_getBalance" => {
                let address: Address = parse_param(params, 0)?;
                let balance = state
                    .chain
                    .balances
                    .get(&address)
                    .copied()
                    .unwrap_or_default();
                Ok(json!(balance))
            }
            "eth_estimateGas" => {
                let _: TransactionRequest = parse_param(params, 0)?;
                Ok(json!(u64_to_quantity(TRANSFER_GAS)))
            }
            "eth_sendTransaction" => {
                let request: TransactionRequest = parse_param(params, 0)?;
                Self::apply_transaction(state, request).map(|hash| json!(hash))
            }
            other => Err(RpcError::Rpc {
                code: METHOD_NOT_FOUND,
                message: format!("Method {} not found", other),
            }),
        }
    }

    fn apply_transaction(state: &mut NodeState, request: TransactionRequest) -> Result<TxHash, RpcError> {
        let from = request.from;
        if !state.unlocked.contains(&from) && !state.impersonated.contains(&from) {
            return Err(server_error(format!("Unknown account {:?}", from)));
        }

        let expected = state.chain.nonces.get(&from).copied().unwrap_or(0);
        if let Some(nonce) = request.nonce {
            if nonce < U256::from(expected) {
                return Err(server_error(format!(
                    "Nonce too low. Expected nonce to be {} but got {}",
                    expected, nonce
                )));
            }
            if nonce > U256::from(expected) {
                return Err(server_error(format!(
                    "Nonce too high. Expected nonce to be {} but got {}",
                    expected, nonce
                )));
            }
        }

        let value = request.value.unwrap_or_default();
        let balance = state.chain.balances.get(&from).copied().unwrap_or_default();
        if value > balance {
            return Err(server_error(format!(
                "Insufficient funds: balance {} is less than value {}",
                balance, value
            )));
        }

        // Applied to a copy so a rejected transaction leaves no trace
        let mut chain = state.chain.clone();
        match request.to {
            Some(to) if to == from => {}
            Some(to) => {
                let credited = chain
                    .balances
                    .get(&to)
                    .copied()
                    .unwrap_or_default()
                    .checked_add(value)
                    .ok_or_else(|| server_error(format!("Balance of {:?} overflows", to)))?;
                chain.balances.insert(from, balance - value);
                chain.balances.insert(to, credited);
            }
            None => {
                chain.balances.insert(from, balance - value);
            }
        }

        chain.nonces.insert(from, expected + 1);
        chain.transaction_count += 1;
        chain.mine()?;

        state.chain = chain;
        Ok(TxHash::from_low_u64_be(state.chain.transaction_count))
    }
}

fn param(params: &Value, index: usize) -> Option<&Value> {
    params.as_array().and_then(|params| params.get(index))
}

fn parse_param<T: DeserializeOwned>(params: &Value, index: usize) -> Result<T, RpcError> {
    let value = param(params, index).ok_or_else(|| invalid_params("missing parameter"))?;
    serde_json::from_value(value.clone()).map_err(|e| invalid_params(&e.to_string()))
}

fn invalid_params(reason: &str) -> RpcError {
    RpcError::Rpc {
        code: INVALID_PARAMS,
        message: format!("Invalid params: {}", reason),
    }
}

fn server_error(message: String) -> RpcError {
    RpcError::Rpc {
        code: SERVER_ERROR,
        message,
    }
}

#[async_trait]
impl NodeRpc for InMemoryNode {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut state = self.state.lock();
        state.request_count += 1;
        if log::log_enabled!(log::Level::Trace) {
            trace!("InMemoryNode: {} {}", method, params);
        }

        if state.failing_methods.contains(method) {
            return Err(RpcError::Rpc {
                code: INTERNAL_ERROR,
                message: format!("Injected failure for {}", method),
            });
        }

        Self::dispatch(&mut state, method, &params)
    }
}
