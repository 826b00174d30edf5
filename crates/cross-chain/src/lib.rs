//! cross-chain: Swap composition through the relay chain
//!
//! Drives a source-chain swap into a bridgeable token, subtracts the bridge
//! fee, checks the destination vault and drives the destination-chain swap.

pub mod orchestrator;
pub mod plan;

pub use orchestrator::{CrossChainOrchestrator, CrossChainRequest, Stage};
pub use plan::{
    leg_steps, path_hops, CrossChainPlan, CrossChainResponse, PathHop, SwapStep, TokenIcons,
    TokenInfo,
};
