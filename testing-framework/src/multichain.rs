//! Helpers for test topologies running two chains side by side.
//!
//! The two chains are driven one after the other. There is no atomicity:
//! when the second chain fails, the first one has already been mutated and
//! stays that way.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    controller::{ChainController, SnapshotId},
    error::ChainError,
    time_input::TimeInput,
};

/// Snapshot ids taken on both chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPair {
    /// Snapshot of the first chain
    pub first: SnapshotId,
    /// Snapshot of the second chain
    pub second: SnapshotId,
}

/// Block heights of both chains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightPair {
    /// Height of the first chain
    pub first: u64,
    /// Height of the second chain
    pub second: u64,
}

/// Increase the time of both chains by `seconds`, mining a block on each
pub async fn fast_forward_multi_chain<T: Into<TimeInput>>(
    seconds: T,
    first: &ChainController,
    second: &ChainController,
) -> Result<(), ChainError> {
    let seconds = seconds.into().to_seconds()?;
    for chain in [first, second] {
        chain.increase_time(seconds).await?;
        chain.mine().await?;
    }

    if log::log_enabled!(log::Level::Debug) {
        debug!("Increased time of both chains by {}s", seconds);
    }
    Ok(())
}

/// Take a snapshot on each chain, mining a block after each
pub async fn take_snapshot_multi_chain(
    first: &ChainController,
    second: &ChainController,
) -> Result<SnapshotPair, ChainError> {
    let first_id = first.snapshot().await?;
    first.mine().await?;

    let second_id = second.snapshot().await?;
    second.mine().await?;

    if log::log_enabled!(log::Level::Debug) {
        debug!("Took snapshots {} and {}", first_id, second_id);
    }
    Ok(SnapshotPair {
        first: first_id,
        second: second_id,
    })
}

/// Revert each chain to its snapshot and mine a block, returning both heights
pub async fn revert_snapshot_multi_chain(
    first: &ChainController,
    second: &ChainController,
    snapshots: &SnapshotPair,
) -> Result<HeightPair, ChainError> {
    first.revert(&snapshots.first).await?;
    first.mine().await?;
    let first_height = first.current_block().await?;

    second.revert(&snapshots.second).await?;
    second.mine().await?;
    let second_height = second.current_block().await?;

    if log::log_enabled!(log::Level::Debug) {
        debug!(
            "Reverted both chains, heights are now {} and {}",
            first_height, second_height
        );
    }
    Ok(HeightPair {
        first: first_height,
        second: second_height,
    })
}
