// Dual-chain helpers: both chains move independently and without rollback

use anyhow::Result;
use devnet_testing_framework::prelude::*;

fn two_chains() -> (Arc<InMemoryNode>, ChainController, Arc<InMemoryNode>, ChainController) {
    let _ = env_logger::builder().is_test(true).try_init();

    let first_node = Arc::new(InMemoryNode::new().with_block(10).with_timestamp(1_000));
    let second_node = Arc::new(InMemoryNode::new().with_block(500).with_timestamp(9_000));
    let first = ChainController::new(first_node.clone());
    let second = ChainController::new(second_node.clone());
    (first_node, first, second_node, second)
}

#[tokio::test]
async fn test_fast_forward_both_chains() -> Result<()> {
    let (_, first, _, second) = two_chains();

    fast_forward_multi_chain("3600", &first, &second).await?;

    assert_eq!(first.current_time().await?, 4_600);
    assert_eq!(second.current_time().await?, 12_600);
    assert_eq!(first.current_block().await?, 11);
    assert_eq!(second.current_block().await?, 501);
    Ok(())
}

#[tokio::test]
async fn test_fast_forward_second_chain_failure_leaves_first_advanced() -> Result<()> {
    let (_, first, second_node, second) = two_chains();
    second_node.fail_method("evm_increaseTime");

    let result = fast_forward_multi_chain(60u64, &first, &second).await;
    assert!(matches!(result, Err(ChainError::Rpc(_))));

    // No rollback of the first chain
    assert_eq!(first.current_time().await?, 1_060);
    assert_eq!(first.current_block().await?, 11);
    assert_eq!(second.current_time().await?, 9_000);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_pair_round_trip() -> Result<()> {
    let (_, first, _, second) = two_chains();

    let snapshots = take_snapshot_multi_chain(&first, &second).await?;
    assert_eq!(first.current_block().await?, 11);
    assert_eq!(second.current_block().await?, 501);

    first.mine_block_bulk(20, true).await?;
    second.mine_block_bulk(5, true).await?;

    let heights = revert_snapshot_multi_chain(&first, &second, &snapshots).await?;
    assert_eq!(
        heights,
        HeightPair {
            first: 11,
            second: 501
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_revert_pair_with_consumed_second_id() -> Result<()> {
    let (_, first, _, second) = two_chains();

    let snapshots = take_snapshot_multi_chain(&first, &second).await?;
    second.revert_snapshot(&snapshots.second).await?;
    first.mine_block_bulk(3, true).await?;

    let result = revert_snapshot_multi_chain(&first, &second, &snapshots).await;
    assert!(matches!(result, Err(ChainError::Rpc(_))));

    // The first chain was reverted before the second one failed
    assert_eq!(first.current_block().await?, 11);
    Ok(())
}
