// Property-based checks of the mining helpers against InMemoryNode

use devnet_testing_framework::prelude::*;
use proptest::prelude::*;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build test runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bulk_sync_mining_adds_exactly_count(start in 0u64..1_000_000, count in 0u64..200) {
        let height = runtime().block_on(async {
            let chain = ChainController::new(Arc::new(InMemoryNode::new().with_block(start)));
            chain.mine_block_bulk(count, true).await
        }).unwrap();

        prop_assert_eq!(height, start + count);
    }

    #[test]
    fn mine_to_twice_equals_once(start in 0u64..1_000, target in 0u64..1_500) {
        let (once, twice) = runtime().block_on(async {
            let chain = ChainController::new(Arc::new(InMemoryNode::new().with_block(start)));
            let once = chain.mine_to(target, true).await.unwrap();
            let twice = chain.mine_to(target, true).await.unwrap();
            (once, twice)
        });

        prop_assert_eq!(once, twice);
        prop_assert_eq!(once, start.max(target));
    }

    #[test]
    fn fast_forward_to_past_always_fails(now in 1u64..4_000_000_000, back in 1u64..1_000_000) {
        let target = now.saturating_sub(back);
        let result = runtime().block_on(async {
            let chain = ChainController::new(Arc::new(InMemoryNode::new().with_timestamp(now)));
            chain.fast_forward_to(target).await
        });

        let is_invalid_target = matches!(result, Err(ChainError::InvalidTimeTarget { .. }));
        prop_assert!(is_invalid_target);
    }
}
