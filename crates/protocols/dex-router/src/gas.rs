//! Gas model
//!
//! Estimates the execution cost of a route as a base cost plus a per-hop
//! cost, then prices it in the quote token and in USD.

use async_trait::async_trait;
use dashmap::DashMap;

use chain_client::ChainClient;
use hubswap_core::{
    chains, normalize_address, ChainId, Decimal, Protocol, RequestContext, Result, RouterError,
    Token, DEFAULT_DIV_PRECISION,
};

use crate::constants::gas;
use crate::state::Route;

/// USD price source for tokens and native currencies.
#[async_trait]
pub trait UsdRateOracle: Send + Sync {
    /// USD value of one whole unit of the asset at `address` on `chain_id`.
    async fn usd_rate(&self, chain_id: ChainId, address: &str) -> Result<Decimal>;
}

/// Oracle answering from a fixed price table.
#[derive(Default)]
pub struct StaticUsdOracle {
    rates: DashMap<(ChainId, String), Decimal>,
}

impl StaticUsdOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&self, chain_id: ChainId, address: &str, rate: Decimal) {
        self.rates
            .insert((chain_id, normalize_address(address)), rate);
    }
}

#[async_trait]
impl UsdRateOracle for StaticUsdOracle {
    async fn usd_rate(&self, chain_id: ChainId, address: &str) -> Result<Decimal> {
        self.rates
            .get(&(chain_id, normalize_address(address)))
            .map(|r| r.value().clone())
            .ok_or_else(|| RouterError::PriceOracle {
                reason: format!("no USD rate for {} on chain {}", address, chain_id),
            })
    }
}

/// Gas unit constants for one protocol on one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasConstants {
    pub base_cost: u64,
    pub cost_per_hop: u64,
    pub cost_per_init_tick: u64,
}

impl GasConstants {
    pub fn for_protocol(protocol: Protocol, chain_id: ChainId) -> Self {
        match protocol {
            Protocol::Curve | Protocol::Ref => Self {
                base_cost: gas::STABLE_BASE_SWAP_COST,
                cost_per_hop: gas::STABLE_COST_PER_EXTRA_HOP,
                cost_per_init_tick: 0,
            },
            p if p.is_concentrated() => Self {
                base_cost: if chain_id == ChainId::ARBITRUM {
                    gas::BASE_SWAP_COST_ARBITRUM
                } else {
                    gas::BASE_SWAP_COST
                },
                cost_per_hop: gas::COST_PER_HOP,
                cost_per_init_tick: gas::COST_PER_INIT_TICK,
            },
            _ => Self {
                base_cost: gas::V2_BASE_SWAP_COST,
                cost_per_hop: gas::V2_COST_PER_EXTRA_HOP,
                cost_per_init_tick: 0,
            },
        }
    }

    /// Units for a route of `hops` pools, assuming one tick crossing per hop.
    pub fn units(&self, hops: usize) -> u64 {
        if hops == 0 {
            return 0;
        }
        let hops = hops as u64;
        self.base_cost + (hops - 1) * self.cost_per_hop + hops * self.cost_per_init_tick
    }
}

/// Cost of executing one route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    pub units: u64,
    pub cost_in_quote_token: u128,
    pub cost_in_usd: Decimal,
}

impl GasEstimate {
    pub fn zero() -> Self {
        Self {
            units: 0,
            cost_in_quote_token: 0,
            cost_in_usd: Decimal::zero(),
        }
    }
}

/// Gas pricing for one protocol and one quote token, fixed for a request.
#[derive(Debug, Clone)]
pub struct GasModel {
    constants: GasConstants,
    gas_price_wei: u128,
    native_decimals: u8,
    native_usd: Decimal,
    quote_token: Token,
    quote_usd: Decimal,
}

impl GasModel {
    /// Read the gas price and both USD rates once.
    ///
    /// Fails with a price-oracle error when either rate is missing or zero,
    /// since gas-adjusted comparison is meaningless without it.
    pub async fn build(
        ctx: &RequestContext,
        client: &ChainClient,
        oracle: &dyn UsdRateOracle,
        protocol: Protocol,
        quote_token: &Token,
    ) -> Result<Self> {
        let chain_id = client.chain_id();
        let info = chains::chain_info(chain_id).ok_or_else(|| RouterError::UnsupportedChain {
            chain: chain_id.to_string(),
        })?;

        let gas_price_wei = client.gas_price(ctx).await?;
        let native_usd = ctx
            .run(oracle.usd_rate(chain_id, info.wrapped_address))
            .await?;
        let quote_usd = ctx
            .run(oracle.usd_rate(chain_id, &quote_token.address))
            .await?;
        if native_usd.is_zero() || quote_usd.is_zero() {
            return Err(RouterError::PriceOracle {
                reason: format!("zero USD rate on chain {}", chain_id),
            });
        }

        Ok(Self {
            constants: GasConstants::for_protocol(protocol, chain_id),
            gas_price_wei,
            native_decimals: info.native_decimals,
            native_usd,
            quote_token: quote_token.clone(),
            quote_usd,
        })
    }

    pub fn constants(&self) -> GasConstants {
        self.constants
    }

    pub fn estimate(&self, route: &Route) -> Result<GasEstimate> {
        if route.is_identity() {
            return Ok(GasEstimate::zero());
        }
        let units = self.constants.units(route.hops());
        let cost_wei = self.gas_price_wei.saturating_mul(units as u128);
        let cost_native = Decimal::from_base_units(cost_wei, self.native_decimals);
        let cost_in_usd = (&cost_native * &self.native_usd).truncate_to_decimals(gas::USD_DECIMALS);
        let cost_in_quote = cost_in_usd
            .div_with_precision(&self.quote_usd, DEFAULT_DIV_PRECISION)?
            .to_base_units(self.quote_token.decimals)?;

        Ok(GasEstimate {
            units,
            cost_in_quote_token: cost_in_quote,
            cost_in_usd,
        })
    }
}
