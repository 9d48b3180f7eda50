//! Convenient re-exports for test code
//!
//! ```rust,ignore
//! use devnet_testing_framework::prelude::*;
//! ```

pub use crate::controller::{ChainController, ControllerConfig, SnapshotId};
pub use crate::error::ChainError;
pub use crate::gas::estimate_gas_margin;
pub use crate::in_memory_node::InMemoryNode;
pub use crate::multichain::{
    fast_forward_multi_chain, revert_snapshot_multi_chain, take_snapshot_multi_chain, HeightPair,
    SnapshotPair,
};
pub use crate::signer::{Signer, TransactionRequest};
pub use crate::time_input::TimeInput;

pub use devnet_common::rpc::{ClientConfig, HttpJsonRpcClient, NodeRpc, RpcError};
pub use devnet_common::units::{format_ether, from_unit, parse_ether, to_comma, to_unit, Unit};
pub use devnet_common::{parse_address, Address, TxHash, U256};

pub use std::sync::Arc;
pub use std::time::Duration;
