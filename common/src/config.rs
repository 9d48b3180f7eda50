// Shared constants for the devnet tooling

// Default JSON-RPC endpoint of a local hardhat / anvil node
pub const DEFAULT_RPC_ENDPOINT: &str = "http://127.0.0.1:8545";

// Environment variables read by `ClientConfig::from_env`
pub const RPC_URL_ENV: &str = "DEVNET_RPC_URL";
pub const RPC_TIMEOUT_ENV: &str = "DEVNET_RPC_TIMEOUT_SECS";

// Request timeouts, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

// Canonical unit of the native currency: 10^18 base units per ether
pub const DEFAULT_DECIMALS: u8 = 18;

// Largest power of ten that still fits in a U256 (10^77 < 2^256 < 10^78)
pub const MAX_DECIMALS: u8 = 77;

// Assumed average block rate used by the "mine N hours" helpers
// This is an approximation, not derived from block timestamps
pub const BLOCKS_PER_HOUR: u64 = 1800;

// Gas estimation margin: estimate * 150 / 100
pub const GAS_MARGIN_PERCENT: u64 = 150;
// Returned when the gas estimate could not be computed
pub const GAS_ESTIMATE_FALLBACK: &str = "5000000";
