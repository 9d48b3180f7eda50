//! # Devnet Testing Framework
//!
//! Convenience layer over the JSON-RPC surface of a local EVM test node
//! (hardhat, anvil-compatible nodes): block mining, time travel,
//! snapshot/revert, account impersonation and value transfers.
//!
//! The framework owns no chain state. Every operation is one or more RPC
//! calls against the node, awaited in order.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use devnet_testing_framework::prelude::*;
//!
//! #[tokio::test]
//! async fn test_vesting_unlocks() -> anyhow::Result<()> {
//!     let chain = ChainController::connect(&ClientConfig::from_env())?;
//!
//!     let snapshot = chain.take_snapshot().await?;
//!     chain.fast_forward(Duration::from_secs(30 * 24 * 3600)).await?;
//!     // ... assertions against the contract ...
//!     chain.revert_snapshot(&snapshot).await?;
//!     Ok(())
//! }
//! ```
//!
//! Tests that do not need a real node can run against [`InMemoryNode`].

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Time, block, snapshot and account operations over a single node
pub mod controller;

/// Error type shared by every operation
pub mod error;

/// Conservative gas limit helper
pub mod gas;

/// Hardhat-like dev node living in memory, for tests
pub mod in_memory_node;

/// Operations applied to two chains at once
pub mod multichain;

/// Signer handles and transaction requests
pub mod signer;

/// Normalization of the time amounts accepted by fast-forward operations
pub mod time_input;

// Convenient re-exports for common usage
pub mod prelude;

pub use controller::{ChainController, ControllerConfig, SnapshotId};
pub use error::ChainError;
pub use gas::estimate_gas_margin;
pub use in_memory_node::InMemoryNode;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
