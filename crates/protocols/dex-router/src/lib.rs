//! dex-router: Same-chain route discovery and split optimization
//!
//! Pipeline per protocol: snapshot -> candidate pools -> routes -> quotes
//! per amount bucket -> gas adjustment. Quotes from every protocol are then
//! merged and searched for the best split.

pub mod calculator;
pub mod constants;
pub mod distribution;
pub mod gas;
pub mod pricing;
pub mod quote;
pub mod router;
pub mod search;
pub mod selector;
pub mod service;
pub mod state;

pub use distribution::{distribute, AmountBucket};
pub use gas::{GasConstants, GasEstimate, GasModel, StaticUsdOracle, UsdRateOracle};
pub use pricing::{ConstantProductPricing, PricingCapability};
pub use router::enumerate_routes;
pub use search::{find_best_swap_route, SearchParams};
pub use selector::{
    sanitize_pools, select_candidate_pools, CandidatePools, SelectionBucket, StaticTokenValidator,
    TokenStatus, TokenValidator,
};
pub use service::{PoolSnapshotSource, StaticPoolSnapshot, SwapRouter};
pub use state::{canonical_pool_id, Pool, PoolIds, QuoteError, Route, RouteWithQuote, SwapPlan};
