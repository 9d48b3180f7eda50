use chrono::{DateTime, Utc};
use devnet_common::{error::UnitError, rpc::RpcError};
use thiserror::Error;

/// Failure of a chain operation
#[derive(Debug, Error)]
pub enum ChainError {
    /// The node (or the transport to it) rejected the call
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// `fast_forward_to` was asked to move the chain back in time
    #[error(
        "Time parameter ({}) is less than now {}.",
        format_timestamp(.target),
        format_timestamp(.now)
    )]
    InvalidTimeTarget {
        /// Requested unix time, in seconds
        target: u64,
        /// Timestamp of the latest block, in seconds
        now: u64,
    },

    /// A time amount could not be normalized to whole seconds
    #[error("Invalid time value: {0}")]
    InvalidTimeInput(String),

    /// `blocks_per_hour * hours` does not fit in 64 bits
    #[error("Cannot mine {hours} hours at {blocks_per_hour} blocks per hour: block count overflows")]
    BlockCountOverflow {
        /// Configured block rate
        blocks_per_hour: u64,
        /// Requested number of hours
        hours: u64,
    },

    /// Amount or unit conversion failure
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// The node answered with something this crate does not understand
    #[error("Unexpected response to '{method}': {reason}")]
    UnexpectedResponse {
        /// RPC method that was called
        method: &'static str,
        /// What was wrong with the answer
        reason: String,
    },
}

impl ChainError {
    pub(crate) fn unexpected(method: &'static str, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            method,
            reason: reason.into(),
        }
    }
}

fn format_timestamp(seconds: &u64) -> String {
    i64::try_from(*seconds)
        .ok()
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
        .map(|date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{}s", seconds))
}
