//! Same-chain swap routing service
//!
//! Wires candidate selection, route enumeration, quoting, gas and the split
//! search for one chain. Each configured protocol runs as its own task; a
//! failing protocol does not block the others.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;

use chain_client::ChainClient;
use hubswap_core::{
    CacheService, ChainId, Protocol, ProtocolPoolSelection, RequestContext, Result, RouterError,
    RoutingConfig, Token, TradeType,
};

use crate::constants::base_tokens;
use crate::distribution::{distribute, AmountBucket};
use crate::gas::{GasModel, UsdRateOracle};
use crate::pricing::{ConstantProductPricing, PricingCapability};
use crate::quote::quote_routes;
use crate::router::enumerate_routes;
use crate::search::{find_best_swap_route, SearchParams};
use crate::selector::{
    sanitize_pools, select_candidate_pools, CandidatePools, StaticTokenValidator, TokenStatus,
    TokenValidator,
};
use crate::state::{Pool, PoolIds, RouteWithQuote, SwapPlan};

/// Source of raw pool snapshots (one list per protocol)
#[async_trait]
pub trait PoolSnapshotSource: Send + Sync {
    async fn pools(&self, chain_id: ChainId, protocol: Protocol) -> Result<Vec<Pool>>;
}

/// Snapshot held in memory, loaded from fixtures.
#[derive(Default)]
pub struct StaticPoolSnapshot {
    pools: DashMap<(ChainId, Protocol), Vec<Pool>>,
}

impl StaticPoolSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pool(&self, pool: Pool) {
        self.pools
            .entry((pool.chain_id(), pool.protocol))
            .or_default()
            .push(pool);
    }

    pub fn extend(&self, pools: impl IntoIterator<Item = Pool>) {
        for pool in pools {
            self.add_pool(pool);
        }
    }
}

#[async_trait]
impl PoolSnapshotSource for StaticPoolSnapshot {
    async fn pools(&self, chain_id: ChainId, protocol: Protocol) -> Result<Vec<Pool>> {
        Ok(self
            .pools
            .get(&(chain_id, protocol))
            .map(|p| p.value().clone())
            .unwrap_or_default())
    }
}

type CandidateKey = (Protocol, Token, Token);

/// Router for one chain
pub struct SwapRouter {
    chain_id: ChainId,
    client: ChainClient,
    snapshots: Arc<dyn PoolSnapshotSource>,
    oracle: Arc<dyn UsdRateOracle>,
    validator: Arc<dyn TokenValidator>,
    pricing: HashMap<Protocol, Arc<dyn PricingCapability>>,
    protocols: Vec<Protocol>,
    base_tokens: Vec<Token>,
    routing: RoutingConfig,
    selection: ProtocolPoolSelection,
    candidates: CacheService<CandidateKey, Arc<CandidatePools>>,
    pool_ids: Arc<PoolIds>,
}

impl SwapRouter {
    /// Router with constant-product pricing for every protocol and no
    /// flagged tokens.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: ChainClient,
        protocols: Vec<Protocol>,
        snapshots: Arc<dyn PoolSnapshotSource>,
        oracle: Arc<dyn UsdRateOracle>,
        routing: RoutingConfig,
        selection: ProtocolPoolSelection,
        candidate_ttl: Duration,
        pool_ids: Arc<PoolIds>,
    ) -> Self {
        let chain_id = client.chain_id();
        let pricing = protocols
            .iter()
            .map(|&p| {
                let capability: Arc<dyn PricingCapability> =
                    Arc::new(ConstantProductPricing::new(p));
                (p, capability)
            })
            .collect();
        Self {
            chain_id,
            client,
            snapshots,
            oracle,
            validator: Arc::new(StaticTokenValidator::new()),
            pricing,
            protocols,
            base_tokens: base_tokens(chain_id),
            routing,
            selection,
            candidates: CacheService::new("candidate_pools", candidate_ttl),
            pool_ids,
        }
    }

    pub fn with_pricing(mut self, capability: Arc<dyn PricingCapability>) -> Self {
        self.pricing.insert(capability.protocol(), capability);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_base_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.base_tokens = tokens;
        self
    }

    /// Purge expired candidate sets in the background.
    pub fn start_cache_cleanup(&self) -> tokio::task::JoinHandle<()> {
        self.candidates.start_cleanup(self.candidates.ttl())
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn protocols(&self) -> &[Protocol] {
        &self.protocols
    }

    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Best plan for swapping `amount` of `token_in` into `token_out`.
    ///
    /// `Ok(None)` means no protocol produced a usable quote. When every
    /// protocol failed outright the first failure is returned instead.
    pub async fn route(
        &self,
        ctx: &RequestContext,
        token_in: &Token,
        token_out: &Token,
        amount: u128,
        trade_type: TradeType,
    ) -> Result<Option<SwapPlan>> {
        ctx.check()?;
        if token_in.chain_id != self.chain_id || token_out.chain_id != self.chain_id {
            return Err(RouterError::validation(format!(
                "tokens must be on chain {}",
                self.chain_id
            )));
        }
        let token_in = token_in.wrapped();
        let token_out = token_out.wrapped();

        if token_in.same_asset(&token_out) {
            tracing::debug!(chain = %self.chain_id, token = %token_in, "direct swap");
            return Ok(Some(SwapPlan::direct(&token_in, amount, trade_type)));
        }
        if amount == 0 {
            return Err(RouterError::validation("amount must be positive"));
        }

        let buckets = distribute(amount, self.routing.distribution_percent)?;
        let tasks = self.protocols.iter().map(|&protocol| {
            let buckets = &buckets;
            let token_in = &token_in;
            let token_out = &token_out;
            async move {
                let res = self
                    .quote_protocol(ctx, protocol, token_in, token_out, buckets, trade_type)
                    .await;
                (protocol, res)
            }
        });

        let mut quotes: Vec<RouteWithQuote> = Vec::new();
        let mut first_error: Option<RouterError> = None;
        let mut failed = 0;
        for (protocol, res) in join_all(tasks).await {
            match res {
                Ok(q) => quotes.extend(q),
                Err(e @ (RouterError::Cancelled | RouterError::DeadlineExceeded)) => return Err(e),
                Err(e) => {
                    tracing::warn!(chain = %self.chain_id, %protocol, "protocol skipped: {}", e);
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if quotes.is_empty() {
            if let Some(e) = first_error.filter(|_| failed == self.protocols.len()) {
                return Err(e);
            }
            tracing::info!(
                chain = %self.chain_id,
                token_in = %token_in,
                token_out = %token_out,
                "no quotes"
            );
            return Ok(None);
        }

        let params = SearchParams::new(&self.routing, trade_type, amount);
        let plan = find_best_swap_route(&quotes, &token_in, &token_out, &params);
        if let Some(plan) = &plan {
            for r in &plan.routes {
                tracing::debug!(
                    chain = %self.chain_id,
                    percent = r.percent,
                    route = %r.route,
                    "plan route"
                );
            }
            tracing::info!(
                chain = %self.chain_id,
                candidates = quotes.len(),
                routes = plan.routes.len(),
                quote = plan.total_quote(),
                gas = plan.total_gas_estimate(),
                gas_usd = %plan.total_gas_cost_usd(),
                "found swap plan"
            );
        }
        Ok(plan)
    }

    async fn quote_protocol(
        &self,
        ctx: &RequestContext,
        protocol: Protocol,
        token_in: &Token,
        token_out: &Token,
        buckets: &[AmountBucket],
        trade_type: TradeType,
    ) -> Result<Vec<RouteWithQuote>> {
        let key = (protocol, token_in.clone(), token_out.clone());
        let candidates = self
            .candidates
            .get_or_try_insert_with(key, || {
                self.load_candidates(ctx, protocol, token_in, token_out)
            })
            .await?;

        let routes = enumerate_routes(
            protocol,
            &candidates.pools,
            token_in,
            token_out,
            self.routing.max_swaps_per_path,
        );
        tracing::debug!(
            chain = %self.chain_id,
            %protocol,
            candidates = candidates.len(),
            routes = routes.len(),
            "enumerated routes"
        );
        if routes.is_empty() {
            return Ok(Vec::new());
        }

        let pricing = self
            .pricing
            .get(&protocol)
            .ok_or_else(|| RouterError::Pricing {
                protocol: protocol.to_string(),
                reason: "no pricing capability registered".to_string(),
            })?;
        let quote_token = match trade_type {
            TradeType::ExactInput => token_out,
            TradeType::ExactOutput => token_in,
        };
        let gas = GasModel::build(
            ctx,
            &self.client,
            self.oracle.as_ref(),
            protocol,
            quote_token,
        )
        .await?;

        quote_routes(
            ctx,
            &self.client,
            pricing.as_ref(),
            &routes,
            buckets,
            trade_type,
            &gas,
            self.routing.max_concurrency,
        )
        .await
    }

    async fn load_candidates(
        &self,
        ctx: &RequestContext,
        protocol: Protocol,
        token_in: &Token,
        token_out: &Token,
    ) -> Result<Arc<CandidatePools>> {
        let raw = ctx
            .run(self.snapshots.pools(self.chain_id, protocol))
            .await?;
        let pools = sanitize_pools(&raw, &self.selection.min_tvl);

        let mut tokens: HashSet<&Token> = HashSet::new();
        for pool in &pools {
            tokens.insert(&pool.token0);
            tokens.insert(&pool.token1);
        }
        tokens.remove(token_in);
        tokens.remove(token_out);
        let checks = tokens.into_iter().map(|t| async move {
            let status = self.validator.validate(t).await?;
            Ok::<_, RouterError>((t.clone(), status))
        });
        let statuses: HashMap<Token, TokenStatus> = ctx
            .run(async { join_all(checks).await.into_iter().collect::<Result<_>>() })
            .await?;

        let candidates = select_candidate_pools(
            &pools,
            token_in,
            token_out,
            &self.base_tokens,
            &statuses,
            &self.selection,
            &self.pool_ids,
        );
        tracing::debug!(
            chain = %self.chain_id,
            %protocol,
            snapshot = raw.len(),
            sanitized = pools.len(),
            candidates = candidates.len(),
            "selected candidate pools"
        );
        Ok(Arc::new(candidates))
    }
}
