//! Basic integration test to verify framework compilation
//!
//! This smoke test ensures the prelude exposes everything a test needs.

use devnet_testing_framework::prelude::*;

#[tokio::test]
async fn test_framework_basic_imports() {
    let chain = ChainController::new(Arc::new(InMemoryNode::new()));

    let before = chain.current_block().await.unwrap();
    let after = chain.mine_block().await.unwrap();

    assert_eq!(after, before + 1, "Mining should advance the chain");
}

#[test]
fn test_framework_version() {
    use devnet_testing_framework::VERSION;

    assert_eq!(VERSION, "0.1.0");
}

#[test]
fn test_connect_builds_http_transport() {
    let chain = ChainController::connect(&ClientConfig::default());
    assert!(chain.is_ok());
    assert_eq!(chain.unwrap().config().blocks_per_hour, 1800);
}

#[test]
fn test_connect_rejects_bad_endpoint() {
    let result = ChainController::connect(&ClientConfig::new("http://"));
    assert!(matches!(
        result,
        Err(ChainError::Rpc(RpcError::InvalidEndpoint(_)))
    ));
}
