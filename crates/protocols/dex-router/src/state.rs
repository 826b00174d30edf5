//! Routing State Types
//!
//! Pools, routes, quoted routes and swap plans.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubswap_core::{CacheService, ChainId, Decimal, Protocol, Token, TradeType};

/// A liquidity pool from the candidate snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// On-chain address (state is read from here)
    pub address: String,
    pub protocol: Protocol,
    pub token0: Token,
    pub token1: Token,
    /// Fee in hundredths of a basis point (3000 = 0.3%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_tier: Option<u32>,
    /// Total value locked in USD, the ranking signal
    #[serde(default = "Decimal::zero")]
    pub tvl_usd: Decimal,
}

impl Pool {
    pub fn chain_id(&self) -> ChainId {
        self.token0.chain_id
    }

    pub fn involves(&self, token: &Token) -> bool {
        self.token0 == *token || self.token1 == *token
    }

    /// Whether the pool trades `a` against `b` directly.
    pub fn connects(&self, a: &Token, b: &Token) -> bool {
        (self.token0 == *a && self.token1 == *b) || (self.token0 == *b && self.token1 == *a)
    }

    /// The counter-token of `token`, if the pool holds it.
    pub fn other(&self, token: &Token) -> Option<&Token> {
        if self.token0 == *token {
            Some(&self.token1)
        } else if self.token1 == *token {
            Some(&self.token0)
        } else {
            None
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} [{}]",
            self.protocol,
            self.token0.label(),
            self.token1.label(),
            self.address
        )
    }
}

/// Canonical pool identity: `protocol:token0:token1[:fee]` over the sorted pair.
pub fn canonical_pool_id(
    protocol: Protocol,
    a: &Token,
    b: &Token,
    fee_tier: Option<u32>,
) -> String {
    let (lo, hi) = if a.address <= b.address {
        (&a.address, &b.address)
    } else {
        (&b.address, &a.address)
    };
    match fee_tier {
        Some(fee) => format!("{}:{}:{}:{}", protocol, lo, hi, fee),
        None => format!("{}:{}:{}", protocol, lo, hi),
    }
}

type PoolKey = (ChainId, Protocol, String, String, Option<u32>);

/// Process-wide memo of canonical pool ids.
pub struct PoolIds {
    cache: CacheService<PoolKey, String>,
}

impl PoolIds {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: CacheService::new("pool_ids", ttl),
        }
    }

    pub fn id_for(&self, pool: &Pool) -> String {
        let key = (
            pool.chain_id(),
            pool.protocol,
            pool.token0.address.clone(),
            pool.token1.address.clone(),
            pool.fee_tier,
        );
        if let Some(id) = self.cache.get(&key) {
            return id;
        }
        let id = canonical_pool_id(pool.protocol, &pool.token0, &pool.token1, pool.fee_tier);
        self.cache.insert(key, id.clone());
        id
    }

    /// Periodically drop memoized ids older than the cache TTL.
    pub fn start_cleanup(&self) -> tokio::task::JoinHandle<()> {
        self.cache.start_cleanup(self.cache.ttl())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// An ordered, non-repeating sequence of pools from one protocol.
///
/// `token_path` has one more element than `pools`. The identity route has
/// no pools and a two-element path of the same token. Deserialization
/// rejects any other shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRoute")]
pub struct Route {
    pub protocol: Option<Protocol>,
    pub pools: Vec<Pool>,
    pub token_path: Vec<Token>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoute {
    protocol: Option<Protocol>,
    pools: Vec<Pool>,
    token_path: Vec<Token>,
}

impl TryFrom<RawRoute> for Route {
    type Error = String;

    fn try_from(raw: RawRoute) -> std::result::Result<Self, Self::Error> {
        let expected = if raw.pools.is_empty() {
            2
        } else {
            raw.pools.len() + 1
        };
        if raw.token_path.len() != expected {
            return Err(format!(
                "route with {} pools needs {} path tokens, got {}",
                raw.pools.len(),
                expected,
                raw.token_path.len()
            ));
        }
        Ok(Self {
            protocol: raw.protocol,
            pools: raw.pools,
            token_path: raw.token_path,
        })
    }
}

impl Route {
    pub fn new(protocol: Protocol, pools: Vec<Pool>, token_path: Vec<Token>) -> Self {
        debug_assert_eq!(token_path.len(), pools.len() + 1);
        Self {
            protocol: Some(protocol),
            pools,
            token_path,
        }
    }

    /// Pass-through route for a token swapped into itself.
    pub fn identity(token: &Token) -> Self {
        Self {
            protocol: None,
            pools: Vec::new(),
            token_path: vec![token.clone(), token.clone()],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn hops(&self) -> usize {
        self.pools.len()
    }

    pub fn input(&self) -> &Token {
        &self.token_path[0]
    }

    pub fn output(&self) -> &Token {
        &self.token_path[self.token_path.len() - 1]
    }

    /// Stable key: two routes are the same if they use the same pools in order.
    pub fn key(&self) -> String {
        let protocol = self.protocol.map(|p| p.as_str()).unwrap_or("");
        let pools: Vec<&str> = self.pools.iter().map(|p| p.address.as_str()).collect();
        format!("{}|{}", protocol, pools.join(">"))
    }

    pub fn dex_name(&self) -> &'static str {
        self.protocol.map(|p| p.as_str()).unwrap_or("")
    }
}

/// Renders as `USDC -- 0.3% [0xpool] --> WETH -- [0xpool] --> DAI`.
impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.token_path.iter().enumerate() {
            f.write_str(token.label())?;
            if let Some(pool) = self.pools.get(i) {
                match pool.fee_tier {
                    Some(fee) => {
                        write!(f, " -- {}% [{}] --> ", fee as f64 / 10_000.0, pool.address)?
                    }
                    None => write!(f, " -- [{}] --> ", pool.address)?,
                }
            } else if i + 1 < self.token_path.len() {
                f.write_str(" --> ")?;
            }
        }
        Ok(())
    }
}

/// A route quoted for one amount bucket.
///
/// `amount` is the bucket's input (EXACT_INPUT) or output (EXACT_OUTPUT);
/// `raw_quote` is the other side. `quote_adjusted_for_gas` is the raw quote
/// minus (EXACT_INPUT) or plus (EXACT_OUTPUT) the gas cost in quote token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWithQuote {
    pub route: Route,
    pub trade_type: TradeType,
    pub percent: u32,
    pub amount: u128,
    pub raw_quote: u128,
    pub gas_estimate: u64,
    pub gas_cost_in_quote_token: u128,
    pub gas_cost_in_usd: Decimal,
    pub quote_adjusted_for_gas: i128,
}

impl RouteWithQuote {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        route: Route,
        trade_type: TradeType,
        percent: u32,
        amount: u128,
        raw_quote: u128,
        gas_estimate: u64,
        gas_cost_in_quote_token: u128,
        gas_cost_in_usd: Decimal,
    ) -> Self {
        let raw = i128::try_from(raw_quote).unwrap_or(i128::MAX);
        let gas = i128::try_from(gas_cost_in_quote_token).unwrap_or(i128::MAX);
        let quote_adjusted_for_gas = match trade_type {
            TradeType::ExactInput => raw.saturating_sub(gas),
            TradeType::ExactOutput => raw.saturating_add(gas),
        };
        Self {
            route,
            trade_type,
            percent,
            amount,
            raw_quote,
            gas_estimate,
            gas_cost_in_quote_token,
            gas_cost_in_usd,
            quote_adjusted_for_gas,
        }
    }

    /// Token amount entering the route.
    pub fn amount_in(&self) -> u128 {
        match self.trade_type {
            TradeType::ExactInput => self.amount,
            TradeType::ExactOutput => self.raw_quote,
        }
    }

    /// Token amount leaving the route.
    pub fn amount_out(&self) -> u128 {
        match self.trade_type {
            TradeType::ExactInput => self.raw_quote,
            TradeType::ExactOutput => self.amount,
        }
    }
}

/// The chosen set of quoted routes for one same-chain swap.
///
/// Percents sum to 100 and the literal `amount`s sum to the requested amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapPlan {
    pub trade_type: TradeType,
    pub token_in: Token,
    pub token_out: Token,
    pub amount: u128,
    pub routes: Vec<RouteWithQuote>,
}

impl SwapPlan {
    /// One-step plan that passes `amount` of `token` through unchanged.
    pub fn direct(token: &Token, amount: u128, trade_type: TradeType) -> Self {
        Self {
            trade_type,
            token_in: token.clone(),
            token_out: token.clone(),
            amount,
            routes: vec![RouteWithQuote::new(
                Route::identity(token),
                trade_type,
                100,
                amount,
                amount,
                0,
                0,
                Decimal::zero(),
            )],
        }
    }

    pub fn is_direct(&self) -> bool {
        self.routes.len() == 1 && self.routes[0].route.is_identity()
    }

    /// Summed raw quote (output for EXACT_INPUT, input for EXACT_OUTPUT).
    pub fn total_quote(&self) -> u128 {
        self.routes.iter().map(|r| r.raw_quote).sum()
    }

    pub fn total_quote_adjusted(&self) -> i128 {
        self.routes.iter().map(|r| r.quote_adjusted_for_gas).sum()
    }

    pub fn total_amount_in(&self) -> u128 {
        self.routes.iter().map(|r| r.amount_in()).sum()
    }

    pub fn total_amount_out(&self) -> u128 {
        self.routes.iter().map(|r| r.amount_out()).sum()
    }

    pub fn total_gas_estimate(&self) -> u64 {
        self.routes.iter().map(|r| r.gas_estimate).sum()
    }

    pub fn total_gas_cost_usd(&self) -> Decimal {
        self.routes
            .iter()
            .fold(Decimal::zero(), |acc, r| &acc + &r.gas_cost_in_usd)
    }
}

/// Quote failures reported by a pricing capability
#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    /// Routine: the pool cannot fill this size
    #[error("Insufficient reserves in pool {pool}")]
    InsufficientReserves { pool: String },

    /// Routine: the input rounds to nothing
    #[error("Insufficient input amount")]
    InsufficientInputAmount,

    #[error("Pricing failed: {reason}")]
    Pricing { reason: String },
}

impl QuoteError {
    /// Routine failures drop the (route, amount) pair; others abort the protocol.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            QuoteError::InsufficientReserves { .. } | QuoteError::InsufficientInputAmount
        )
    }
}
