//! bridge: Relay-chain bridge fees and vault liquidity
//!
//! Every cross-chain transfer passes through the relay chain. This crate
//! answers how much that transfer costs and whether the destination vault
//! can release it.

pub mod fee;
pub mod registry;
pub mod token_map;
pub mod vault;

pub use fee::{estimate_bridge_fee, fee_amount, BridgeFee};
pub use registry::{BridgeError, BridgeRegistry, FeeRate, InMemoryBridgeRegistry};
pub use token_map::{BridgeToken, TokenMap};
pub use vault::{get_vault_balance, has_liquidity, VaultBalance};
