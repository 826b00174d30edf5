//! Cross-chain swap composition
//!
//! A request moves through
//! `Validating -> SourceLegRouting -> BridgeFeeLookup -> LiquidityCheck ->
//! TargetLegRouting -> Assembled`; any stage can end it. Validation runs
//! before any I/O and nothing partially assembled is ever returned.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use bridge::{estimate_bridge_fee, get_vault_balance, BridgeFee, BridgeRegistry, BridgeToken, TokenMap};
use dex_router::{Route, RouteWithQuote, SwapPlan, SwapRouter};
use hubswap_core::{
    is_supported, ChainId, Decimal, Leg, RequestContext, Result, RouterError, Token, TradeType,
};

use crate::plan::CrossChainPlan;

/// A cross-chain quote request. Chains are taken from the tokens.
#[derive(Debug, Clone)]
pub struct CrossChainRequest {
    pub token_in: Token,
    pub token_out: Token,
    /// Amount of `token_in` in whole-token units
    pub amount: Decimal,
}

impl CrossChainRequest {
    pub fn from_chain(&self) -> ChainId {
        self.token_in.chain_id
    }

    pub fn to_chain(&self) -> ChainId {
        self.token_out.chain_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    SourceLegRouting,
    BridgeFeeLookup,
    LiquidityCheck,
    TargetLegRouting,
    Assembled,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::SourceLegRouting => "source_leg_routing",
            Stage::BridgeFeeLookup => "bridge_fee_lookup",
            Stage::LiquidityCheck => "liquidity_check",
            Stage::TargetLegRouting => "target_leg_routing",
            Stage::Assembled => "assembled",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = stage.as_str(), to = next.as_str(), "stage");
    *stage = next;
}

/// Composes source swap, bridge transfer and destination swap.
pub struct CrossChainOrchestrator {
    routers: HashMap<ChainId, Arc<SwapRouter>>,
    registry: Arc<dyn BridgeRegistry>,
    token_map: Arc<TokenMap>,
}

impl CrossChainOrchestrator {
    pub fn new(registry: Arc<dyn BridgeRegistry>, token_map: Arc<TokenMap>) -> Self {
        Self {
            routers: HashMap::new(),
            registry,
            token_map,
        }
    }

    pub fn with_router(mut self, router: Arc<SwapRouter>) -> Self {
        self.routers.insert(router.chain_id(), router);
        self
    }

    pub fn router(&self, chain_id: ChainId) -> Option<&Arc<SwapRouter>> {
        self.routers.get(&chain_id)
    }

    pub fn token_map(&self) -> &TokenMap {
        &self.token_map
    }

    /// Plan a cross-chain swap. Every log line of the request carries its
    /// `request_id`.
    pub async fn plan(&self, ctx: &RequestContext, request: &CrossChainRequest) -> Result<CrossChainPlan> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "cross_chain",
            %request_id,
            from = %request.from_chain(),
            to = %request.to_chain()
        );

        async move {
            let mut stage = Stage::Validating;
            let res = self.compose(ctx, request, request_id, &mut stage).await;
            match &res {
                Ok(plan) => tracing::info!(
                    bridged = plan.bridged_amount,
                    fee = plan.bridge_fee.amount,
                    "cross-chain plan assembled"
                ),
                Err(e) => tracing::warn!(
                    stage = stage.as_str(),
                    kind = e.kind(),
                    leg = e.leg().map(|l| l.as_str()).unwrap_or("-"),
                    "cross-chain plan failed: {}",
                    e
                ),
            }
            res
        }
        .instrument(span)
        .await
    }

    async fn compose(
        &self,
        ctx: &RequestContext,
        request: &CrossChainRequest,
        request_id: Uuid,
        stage: &mut Stage,
    ) -> Result<CrossChainPlan> {
        let (token_in, token_out, amount) = self.validate(request)?;
        let (from, to) = (token_in.chain_id, token_out.chain_id);
        let entries = self.bridge_entries(from, to)?;
        ctx.check()?;

        enter(stage, Stage::SourceLegRouting);
        let (source_plan, entry) = self.route_to_bridge(ctx, &token_in, amount, &entries).await?;
        let bridge_token = source_plan.token_out.clone();
        let source_out = source_plan.total_amount_out();

        enter(stage, Stage::BridgeFeeLookup);
        let fee = estimate_bridge_fee(ctx, self.registry.as_ref(), &bridge_token, source_out, to).await?;
        let bridged = subtract_fee(source_out, &fee, bridge_token.decimals)?;

        enter(stage, Stage::LiquidityCheck);
        let vault = if to.is_relay() {
            None
        } else {
            let vault = get_vault_balance(ctx, self.registry.as_ref(), &bridge_token, to).await?;
            if !vault.covers(bridged, bridge_token.decimals) {
                return Err(RouterError::InsufficientLiquidity {
                    leg: Leg::Relay,
                    required: Decimal::from_base_units(bridged, bridge_token.decimals).to_string(),
                    available: vault.as_decimal().to_string(),
                });
            }
            Some(vault)
        };

        enter(stage, Stage::TargetLegRouting);
        let target_in = entry.on_chain(to).ok_or_else(|| RouterError::NoRouteFound {
            leg: Leg::Target,
            reason: format!("{} is not bridgeable to chain {}", bridge_token, to),
        })?;
        let target_amount = rescale(bridged, bridge_token.decimals, target_in.decimals)?;
        if target_amount == 0 {
            return Err(RouterError::NoRouteFound {
                leg: Leg::Target,
                reason: "bridged amount rounds to zero".to_string(),
            });
        }
        let target_plan = self
            .route_from_bridge(ctx, target_in, &token_out, target_amount)
            .await?;

        enter(stage, Stage::Assembled);
        let relay_token = &entry.relay_token;
        let (source_leg, relay_leg, target_leg) = if from.is_relay() {
            let relay_leg = if source_plan.is_direct() {
                relay_transfer(&source_plan.token_in, source_out, bridged)
            } else {
                source_plan
            };
            (None, relay_leg, Some(target_plan))
        } else if to.is_relay() {
            let relay_leg = if target_plan.is_direct() {
                let relay_in = rescale(source_out, bridge_token.decimals, relay_token.decimals)?;
                relay_transfer(&target_plan.token_out, relay_in, target_amount)
            } else {
                target_plan
            };
            (Some(source_plan), relay_leg, None)
        } else {
            let relay_in = rescale(source_out, bridge_token.decimals, relay_token.decimals)?;
            let relay_out = rescale(bridged, bridge_token.decimals, relay_token.decimals)?;
            (
                Some(source_plan),
                relay_transfer(relay_token, relay_in, relay_out),
                Some(target_plan),
            )
        };

        Ok(CrossChainPlan {
            request_id,
            source_leg,
            relay_leg,
            target_leg,
            bridge_fee: fee,
            bridged_amount: bridged,
            vault,
        })
    }

    /// Request-level checks; no I/O happens before these pass.
    fn validate(&self, request: &CrossChainRequest) -> Result<(Token, Token, u128)> {
        let (from, to) = (request.from_chain(), request.to_chain());
        if from == to {
            return Err(RouterError::SameChain {
                chain: from.to_string(),
            });
        }
        for chain in [from, to] {
            let routable = chain.is_relay() || self.routers.contains_key(&chain);
            if !is_supported(chain) || !routable {
                return Err(RouterError::UnsupportedChain {
                    chain: chain.to_string(),
                });
            }
        }

        let token_in = request.token_in.wrapped();
        let token_out = request.token_out.wrapped();
        let amount = request.amount.to_base_units(token_in.decimals)?;
        if amount == 0 {
            return Err(RouterError::validation(format!(
                "amount {} is zero at {} decimals",
                request.amount, token_in.decimals
            )));
        }
        Ok((token_in, token_out, amount))
    }

    /// Bridgeable assets mapped on both chains.
    fn bridge_entries(&self, from: ChainId, to: ChainId) -> Result<Vec<&BridgeToken>> {
        let entries: Vec<&BridgeToken> = self
            .token_map
            .tokens
            .iter()
            .filter(|e| e.on_chain(from).is_some() && e.on_chain(to).is_some())
            .collect();
        if entries.is_empty() {
            return Err(RouterError::NoRouteFound {
                leg: Leg::Relay,
                reason: format!("no bridgeable token between chains {} and {}", from, to),
            });
        }
        Ok(entries)
    }

    /// Swap `token_in` into whichever bridgeable token yields the most.
    async fn route_to_bridge<'a>(
        &self,
        ctx: &RequestContext,
        token_in: &Token,
        amount: u128,
        entries: &[&'a BridgeToken],
    ) -> Result<(SwapPlan, &'a BridgeToken)> {
        let chain = token_in.chain_id;
        let bridgeable: Vec<(&'a BridgeToken, &'a Token)> = entries
            .iter()
            .filter_map(|&e| e.on_chain(chain).map(|t| (e, t)))
            .collect();

        if let Some(&(entry, _)) = bridgeable.iter().find(|(_, t)| t.same_asset(token_in)) {
            tracing::debug!(%chain, token = %token_in, "source token is bridgeable");
            return Ok((SwapPlan::direct(token_in, amount, TradeType::ExactInput), entry));
        }

        let router = self.routers.get(&chain).ok_or_else(|| RouterError::NoRouteFound {
            leg: Leg::Source,
            reason: format!("no router for chain {}", chain),
        })?;

        let searches = bridgeable.iter().map(|&(entry, bridge_token)| async move {
            let res = router
                .route(ctx, token_in, bridge_token, amount, TradeType::ExactInput)
                .await;
            (entry, bridge_token, res)
        });

        let mut best: Option<(SwapPlan, &'a BridgeToken, Decimal)> = None;
        let mut first_error: Option<RouterError> = None;
        for (entry, bridge_token, res) in join_all(searches).await {
            match res {
                Ok(Some(plan)) => {
                    let adjusted = u128::try_from(plan.total_quote_adjusted()).unwrap_or(0);
                    let total = Decimal::from_base_units(adjusted, bridge_token.decimals);
                    tracing::debug!(bridge_token = %bridge_token, %total, "source leg candidate");
                    if best.as_ref().map_or(true, |(_, _, b)| total > *b) {
                        best = Some((plan, entry, total));
                    }
                }
                Ok(None) => {}
                Err(e @ (RouterError::Cancelled | RouterError::DeadlineExceeded)) => return Err(e),
                Err(e) => {
                    tracing::warn!(bridge_token = %bridge_token, "source leg search failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match (best, first_error) {
            (Some((plan, entry, _)), _) => Ok((plan, entry)),
            (None, Some(e)) => Err(e),
            (None, None) => Err(RouterError::NoRouteFound {
                leg: Leg::Source,
                reason: format!("no route from {} to a bridgeable token", token_in),
            }),
        }
    }

    /// Swap the bridged token into `token_out` on the destination chain.
    async fn route_from_bridge(
        &self,
        ctx: &RequestContext,
        bridge_token: &Token,
        token_out: &Token,
        amount: u128,
    ) -> Result<SwapPlan> {
        if bridge_token.same_asset(token_out) {
            let amount = rescale(amount, bridge_token.decimals, token_out.decimals)?;
            return Ok(SwapPlan::direct(token_out, amount, TradeType::ExactInput));
        }

        let chain = token_out.chain_id;
        let router = self.routers.get(&chain).ok_or_else(|| RouterError::NoRouteFound {
            leg: Leg::Target,
            reason: format!("no router for chain {}", chain),
        })?;
        router
            .route(ctx, bridge_token, token_out, amount, TradeType::ExactInput)
            .await?
            .ok_or_else(|| RouterError::NoRouteFound {
                leg: Leg::Target,
                reason: format!("no route from {} to {}", bridge_token, token_out),
            })
    }
}

/// `amount - fee`, truncated to the token's decimals. The fee must leave
/// something to bridge.
fn subtract_fee(amount: u128, fee: &BridgeFee, decimals: u8) -> Result<u128> {
    let remaining = Decimal::from_base_units(amount, decimals) - fee.as_decimal();
    if remaining.is_negative() || remaining.is_zero() {
        return Err(RouterError::NoRouteFound {
            leg: Leg::Relay,
            reason: format!(
                "amount {} does not cover bridge fee {}",
                Decimal::from_base_units(amount, decimals),
                fee.as_decimal()
            ),
        });
    }
    remaining
        .truncate_to_decimals(decimals as u32)
        .to_base_units(decimals)
}

/// Move `amount` between decimal counts, truncating.
fn rescale(amount: u128, from_decimals: u8, to_decimals: u8) -> Result<u128> {
    Decimal::from_base_units(amount, from_decimals).to_base_units(to_decimals)
}

/// Identity step whose output is less than its input by the bridge fee.
fn relay_transfer(token: &Token, amount_in: u128, amount_out: u128) -> SwapPlan {
    SwapPlan {
        trade_type: TradeType::ExactInput,
        token_in: token.clone(),
        token_out: token.clone(),
        amount: amount_in,
        routes: vec![RouteWithQuote::new(
            Route::identity(token),
            TradeType::ExactInput,
            100,
            amount_in,
            amount_out,
            0,
            0,
            Decimal::zero(),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bridge::{FeeRate, InMemoryBridgeRegistry};
    use chain_client::{ChainClient, StaticChainData};
    use dex_router::{Pool, PoolIds, StaticPoolSnapshot, StaticUsdOracle};
    use hubswap_core::{
        Protocol, ProtocolPoolSelection, RetryPolicy, RoutingConfig, RELAY_CHAIN,
    };

    const E18: u128 = 1_000_000_000_000_000_000;
    const CAKE: &str = "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82";
    const WBNB: &str = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c";
    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    fn make_pool(addr: &str, protocol: Protocol, a: &Token, b: &Token) -> Pool {
        Pool {
            address: addr.to_string(),
            protocol,
            token0: a.clone(),
            token1: b.clone(),
            fee_tier: None,
            tvl_usd: Decimal::from_integer(1_000_000),
        }
    }

    fn usdc_on(chain: ChainId) -> Token {
        TokenMap::mainnet().bridgeable_tokens(chain).remove(0)
    }

    fn cake() -> Token {
        Token::new(ChainId::BSC, CAKE, 18, "CAKE", "PancakeSwap Token")
    }

    fn weth() -> Token {
        Token::new(ChainId::ETHEREUM, WETH, 18, "WETH", "Wrapped Ether")
    }

    struct Fixture {
        registry: Arc<InMemoryBridgeRegistry>,
        bsc_data: Arc<StaticChainData>,
        orchestrator: CrossChainOrchestrator,
    }

    async fn make_router(
        data: Arc<StaticChainData>,
        protocol: Protocol,
        snapshot: Arc<StaticPoolSnapshot>,
        oracle: Arc<StaticUsdOracle>,
    ) -> Arc<SwapRouter> {
        let client = ChainClient::new(data, RetryPolicy::none(), Duration::from_secs(1)).await;
        Arc::new(SwapRouter::new(
            client,
            vec![protocol],
            snapshot,
            oracle,
            RoutingConfig::default(),
            ProtocolPoolSelection::default(),
            Duration::from_secs(60),
            Arc::new(PoolIds::new(Duration::from_secs(300))),
        ))
    }

    async fn make_fixture(bsc_vault_balance: u128) -> Fixture {
        let token_map = Arc::new(TokenMap::mainnet());
        let registry = Arc::new(InMemoryBridgeRegistry::new(TokenMap::mainnet()));
        let relay_usdc = usdc_on(RELAY_CHAIN);
        // 0.2%, at least 1 and at most 500 USDC
        let rate = FeeRate {
            lowest: E18,
            highest: 500 * E18,
            rate: 2_000,
        };
        for chain in [ChainId::BSC, ChainId::ETHEREUM, RELAY_CHAIN] {
            registry.set_fee_rate(&relay_usdc.address, chain, rate);
        }
        registry.set_vault(&relay_usdc.address, "0x00000000000000000000000000000000000000aa");
        registry.set_vault_balance(
            "0x00000000000000000000000000000000000000aa",
            ChainId::BSC,
            bsc_vault_balance,
        );
        registry.set_vault_balance(
            "0x00000000000000000000000000000000000000aa",
            ChainId::ETHEREUM,
            1_000_000 * E18,
        );

        let oracle = Arc::new(StaticUsdOracle::new());
        oracle.set_rate(ChainId::BSC, WBNB, Decimal::from_integer(300));
        oracle.set_rate(ChainId::BSC, CAKE, Decimal::from_integer(2));
        oracle.set_rate(ChainId::BSC, &usdc_on(ChainId::BSC).address, Decimal::from_integer(1));
        oracle.set_rate(ChainId::ETHEREUM, WETH, Decimal::from_integer(2_000));
        oracle.set_rate(ChainId::ETHEREUM, &usdc_on(ChainId::ETHEREUM).address, Decimal::from_integer(1));

        let bsc_data = Arc::new(StaticChainData::new(ChainId::BSC, 1_000_000_000));
        let bsc_snapshot = Arc::new(StaticPoolSnapshot::new());
        bsc_data.set_reserves("0xb1", 1_000_000 * E18, 500_000 * E18);
        bsc_snapshot.add_pool(make_pool("0xb1", Protocol::PancakeSwap, &usdc_on(ChainId::BSC), &cake()));

        let eth_data = Arc::new(StaticChainData::new(ChainId::ETHEREUM, 1_000_000_000));
        let eth_snapshot = Arc::new(StaticPoolSnapshot::new());
        eth_data.set_reserves("0xe1", 1_000 * E18, 2_000_000 * 1_000_000);
        eth_snapshot.add_pool(make_pool("0xe1", Protocol::UniswapV2, &weth(), &usdc_on(ChainId::ETHEREUM)));

        let orchestrator = CrossChainOrchestrator::new(registry.clone(), token_map)
            .with_router(make_router(bsc_data.clone(), Protocol::PancakeSwap, bsc_snapshot, oracle.clone()).await)
            .with_router(make_router(eth_data, Protocol::UniswapV2, eth_snapshot, oracle).await);

        Fixture {
            registry,
            bsc_data,
            orchestrator,
        }
    }

    fn make_request(token_in: Token, token_out: Token, amount: &str) -> CrossChainRequest {
        CrossChainRequest {
            token_in,
            token_out,
            amount: Decimal::parse(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_same_chain_rejected_before_io() {
        let fx = make_fixture(1_000_000 * E18).await;
        let request = make_request(usdc_on(ChainId::BSC), cake(), "10");
        let err = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::SameChain { .. }));
        assert_eq!(fx.registry.calls(), 0);
        assert_eq!(fx.bsc_data.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_chains() {
        let fx = make_fixture(1_000_000 * E18).await;
        let arb = Token::new(ChainId::ARBITRUM, "0xaf88d065e77c8cc2239327c5edb3a432268e5831", 6, "USDC", "USD Coin");
        let err = fx
            .orchestrator
            .plan(&RequestContext::background(), &make_request(cake(), arb, "1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported_chain");

        // Supported, but no router wired for it
        let err = fx
            .orchestrator
            .plan(&RequestContext::background(), &make_request(cake(), usdc_on(ChainId::POLYGON), "1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported_chain");
        assert_eq!(fx.registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_from_relay_chain() {
        let fx = make_fixture(1_000_000 * E18).await;
        let request = make_request(usdc_on(RELAY_CHAIN), cake(), "100");
        let plan = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap();

        // 0.2% of 100 is below the 1 USDC floor
        assert_eq!(plan.bridge_fee.amount, E18);
        assert_eq!(plan.bridged_amount, 99 * E18);
        assert!(plan.source_leg.is_none());

        let relay = &plan.relay_leg.routes[0];
        assert!(relay.route.is_identity());
        assert_eq!(relay.amount_in(), 100 * E18);
        assert_eq!(relay.amount_out(), 99 * E18);

        let target = plan.target_leg.as_ref().unwrap();
        assert_eq!(target.total_amount_in(), 99 * E18);
        assert_eq!(target.token_out, cake());
        assert!(target.total_amount_out() > 0);
        assert!(plan.vault.is_some());
    }

    #[tokio::test]
    async fn test_three_legs() {
        let fx = make_fixture(1_000_000 * E18).await;
        let request = make_request(weth(), cake(), "1");
        let plan = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap();

        let source = plan.source_leg.as_ref().unwrap();
        assert_eq!(source.total_amount_in(), E18);
        assert_eq!(source.token_out, usdc_on(ChainId::ETHEREUM));
        let source_out = source.total_amount_out();
        assert_eq!(plan.bridged_amount, source_out - plan.bridge_fee.amount);

        let relay = &plan.relay_leg.routes[0];
        assert_eq!(relay.amount_in(), source_out * 1_000_000_000_000);
        assert_eq!(relay.amount_out(), plan.bridged_amount * 1_000_000_000_000);

        let target = plan.target_leg.as_ref().unwrap();
        assert_eq!(target.total_amount_in(), plan.bridged_amount * 1_000_000_000_000);
        assert_eq!(target.token_in, usdc_on(ChainId::BSC));
    }

    #[tokio::test]
    async fn test_to_relay_chain() {
        let fx = make_fixture(1_000_000 * E18).await;
        let request = make_request(cake(), usdc_on(RELAY_CHAIN), "10");
        let plan = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap();

        assert!(plan.target_leg.is_none());
        assert!(plan.vault.is_none());
        let source = plan.source_leg.as_ref().unwrap();
        assert_eq!(source.token_out, usdc_on(ChainId::BSC));
        assert_eq!(plan.relay_leg.token_out, usdc_on(RELAY_CHAIN));
        assert_eq!(plan.relay_leg.total_amount_out(), plan.bridged_amount);
    }

    #[tokio::test]
    async fn test_insufficient_vault_liquidity() {
        let fx = make_fixture(10 * E18).await;
        let request = make_request(usdc_on(RELAY_CHAIN), cake(), "100");
        let err = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_liquidity");
        assert_eq!(err.leg(), Some(Leg::Relay));
        // target leg never routed
        assert_eq!(fx.bsc_data.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_source_route() {
        let fx = make_fixture(1_000_000 * E18).await;
        let orphan = Token::new(ChainId::ETHEREUM, "0x1111111111111111111111111111111111111111", 18, "ORP", "Orphan");
        let err = fx
            .orchestrator
            .plan(&RequestContext::background(), &make_request(orphan, cake(), "5"))
            .await
            .unwrap_err();
        assert_eq!(err.leg(), Some(Leg::Source));
        assert_eq!(err.kind(), "no_route_found");
    }

    #[tokio::test]
    async fn test_fee_larger_than_amount() {
        let fx = make_fixture(1_000_000 * E18).await;
        let request = make_request(usdc_on(RELAY_CHAIN), cake(), "0.5");
        let err = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap_err();
        assert_eq!(err.leg(), Some(Leg::Relay));
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let fx = make_fixture(1_000_000 * E18).await;
        let ctx = RequestContext::background();
        ctx.cancel();
        let err = fx
            .orchestrator
            .plan(&ctx, &make_request(weth(), cake(), "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Cancelled));
    }

    #[tokio::test]
    async fn test_response_shape() {
        let fx = make_fixture(1_000_000 * E18).await;
        let request = make_request(usdc_on(RELAY_CHAIN), cake(), "100");
        let plan = fx
            .orchestrator
            .plan(&RequestContext::background(), &request)
            .await
            .unwrap();

        let response = plan.to_response(&crate::plan::TokenIcons::new(), &request.token_in.address, CAKE);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("srcChain").is_none());
        let map_leg = &json["mapChain"][0];
        assert_eq!(map_leg["chainId"], "22776");
        assert_eq!(map_leg["dexName"], "");
        assert_eq!(map_leg["amountIn"], "100");
        assert_eq!(map_leg["amountOut"], "99");
        assert_eq!(map_leg["path"].as_array().unwrap().len(), 0);

        let target = &json["targetChain"][0];
        assert_eq!(target["chainId"], "56");
        assert_eq!(target["dexName"], "PANCAKESWAP");
        assert_eq!(target["tokenOut"]["address"], CAKE);
        assert_eq!(target["path"][0]["id"], "0xb1");
    }
}
