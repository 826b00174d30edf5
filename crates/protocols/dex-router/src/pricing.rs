//! Pricing capabilities
//!
//! Each protocol family prices a route from pool state read on chain. The
//! route search is agnostic to how a family computes its quote.

use std::collections::HashMap;

use async_trait::async_trait;

use chain_client::PoolState;
use hubswap_core::{Protocol, TradeType};

use crate::calculator::{calculate_input, calculate_output};
use crate::constants::default_fee_ppm;
use crate::state::{Pool, QuoteError, Route};

/// Quotes routes of one protocol family.
///
/// For EXACT_INPUT `amount` enters the route and the result is the output;
/// for EXACT_OUTPUT `amount` leaves the route and the result is the input.
#[async_trait]
pub trait PricingCapability: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn quote(
        &self,
        route: &Route,
        states: &HashMap<String, PoolState>,
        amount: u128,
        trade_type: TradeType,
    ) -> Result<u128, QuoteError>;
}

/// Constant-product pricing over plain reserves.
///
/// Serves the v2-style families and stands in for the others when their
/// snapshot exposes reserves.
pub struct ConstantProductPricing {
    protocol: Protocol,
}

impl ConstantProductPricing {
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol }
    }

    /// Reserves oriented as (reserve of `from`, reserve of the other side).
    fn oriented_reserves(
        pool: &Pool,
        from_is_token0: bool,
        states: &HashMap<String, PoolState>,
    ) -> Result<(u128, u128), QuoteError> {
        let state = states
            .get(&pool.address)
            .ok_or_else(|| QuoteError::InsufficientReserves {
                pool: pool.address.clone(),
            })?;
        let (r0, r1) = state.reserves().ok_or_else(|| QuoteError::Pricing {
            reason: format!("pool {} has no reserve data", pool.address),
        })?;
        if r0 == 0 || r1 == 0 {
            return Err(QuoteError::InsufficientReserves {
                pool: pool.address.clone(),
            });
        }
        Ok(if from_is_token0 { (r0, r1) } else { (r1, r0) })
    }

    fn fee(pool: &Pool) -> u32 {
        pool.fee_tier
            .unwrap_or_else(|| default_fee_ppm(pool.protocol))
    }
}

#[async_trait]
impl PricingCapability for ConstantProductPricing {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn quote(
        &self,
        route: &Route,
        states: &HashMap<String, PoolState>,
        amount: u128,
        trade_type: TradeType,
    ) -> Result<u128, QuoteError> {
        if route.is_identity() {
            return Ok(amount);
        }
        if amount == 0 {
            return Err(QuoteError::InsufficientInputAmount);
        }

        match trade_type {
            TradeType::ExactInput => {
                let mut current = amount;
                for (i, pool) in route.pools.iter().enumerate() {
                    let from_is_token0 = pool.token0 == route.token_path[i];
                    let (r_in, r_out) = Self::oriented_reserves(pool, from_is_token0, states)?;
                    current = calculate_output(r_in, r_out, current, Self::fee(pool));
                    if current == 0 {
                        return Err(QuoteError::InsufficientInputAmount);
                    }
                }
                Ok(current)
            }
            TradeType::ExactOutput => {
                let mut current = amount;
                for (i, pool) in route.pools.iter().enumerate().rev() {
                    let from_is_token0 = pool.token0 == route.token_path[i];
                    let (r_in, r_out) = Self::oriented_reserves(pool, from_is_token0, states)?;
                    current = calculate_input(r_in, r_out, current, Self::fee(pool)).ok_or_else(
                        || QuoteError::InsufficientReserves {
                            pool: pool.address.clone(),
                        },
                    )?;
                }
                Ok(current)
            }
        }
    }
}
