use std::{fmt::Display, future::Future, panic::AssertUnwindSafe};

use devnet_common::{
    config::{GAS_ESTIMATE_FALLBACK, GAS_MARGIN_PERCENT},
    U256,
};
use futures::FutureExt;
use log::warn;

/// Gas limit with a 50% margin over `execution`'s estimate.
///
/// Any failure of the estimate (an error, a panic while computing it, or
/// a margin that overflows 256 bits) yields the fixed fallback `"5000000"`
/// instead of an error.
pub async fn estimate_gas_margin<F, E>(execution: F) -> String
where
    F: Future<Output = Result<U256, E>>,
    E: Display,
{
    match AssertUnwindSafe(execution).catch_unwind().await {
        Ok(Ok(estimate)) => match estimate.checked_mul(U256::from(GAS_MARGIN_PERCENT)) {
            Some(scaled) => (scaled / U256::from(100u64)).to_string(),
            None => {
                warn!("Gas estimate {} overflows with margin, using {}", estimate, GAS_ESTIMATE_FALLBACK);
                GAS_ESTIMATE_FALLBACK.to_string()
            }
        },
        Ok(Err(e)) => {
            warn!("Gas estimation failed, using {}: {}", GAS_ESTIMATE_FALLBACK, e);
            GAS_ESTIMATE_FALLBACK.to_string()
        }
        Err(_) => {
            warn!("Gas estimation panicked, using {}", GAS_ESTIMATE_FALLBACK);
            GAS_ESTIMATE_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;

    #[tokio::test]
    async fn test_margin_is_truncated() {
        let margin = estimate_gas_margin(ready(Ok::<_, String>(U256::from(21_001u64)))).await;
        // 21001 * 1.5 = 31501.5
        assert_eq!(margin, "31501");
    }

    #[tokio::test]
    async fn test_error_falls_back() {
        let margin = estimate_gas_margin(ready(Err::<U256, _>("execution reverted"))).await;
        assert_eq!(margin, "5000000");
    }

    #[tokio::test]
    async fn test_overflow_falls_back() {
        let margin = estimate_gas_margin(ready(Ok::<_, String>(U256::MAX))).await;
        assert_eq!(margin, "5000000");
    }
}
