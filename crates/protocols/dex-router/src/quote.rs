//! Quote aggregation for one protocol
//!
//! Prices every (route, amount bucket) pair against pool state read in one
//! batched pass, then attaches gas costs.

use futures::stream::{self, StreamExt};

use chain_client::ChainClient;
use hubswap_core::{RequestContext, Result, RouterError, TradeType};

use crate::distribution::AmountBucket;
use crate::gas::GasModel;
use crate::pricing::PricingCapability;
use crate::state::{QuoteError, Route, RouteWithQuote};

/// Quote every route at every bucket.
///
/// Routine quote failures (thin reserves, dust input) drop the pair. The
/// result keeps route-major, bucket-minor order so bucket `i` of a route is
/// always `(i + 1) * step` percent.
#[allow(clippy::too_many_arguments)]
pub async fn quote_routes(
    ctx: &RequestContext,
    client: &ChainClient,
    pricing: &dyn PricingCapability,
    routes: &[Route],
    buckets: &[AmountBucket],
    trade_type: TradeType,
    gas_model: &GasModel,
    max_concurrency: usize,
) -> Result<Vec<RouteWithQuote>> {
    let protocol = pricing.protocol();
    let addresses: Vec<String> = routes
        .iter()
        .flat_map(|r| r.pools.iter().map(|p| p.address.clone()))
        .collect();
    let states = client.pool_states(ctx, &addresses).await?;
    tracing::debug!(
        %protocol,
        routes = routes.len(),
        pools = states.len(),
        "loaded pool states"
    );

    let states = &states;
    let jobs: Vec<(&Route, AmountBucket)> = routes
        .iter()
        .flat_map(|route| buckets.iter().map(move |bucket| (route, *bucket)))
        .collect();

    let quoted: Vec<Result<Option<RouteWithQuote>>> = ctx
        .run(async {
            let jobs = &jobs;
            Ok(stream::iter(0..jobs.len())
                .map(|i| {
                    let (route, bucket) = jobs[i];
                    async move {
                        match pricing
                            .quote(route, states, bucket.amount, trade_type)
                            .await
                        {
                            Ok(raw) => {
                                let gas = gas_model.estimate(route)?;
                                Ok(Some(RouteWithQuote::new(
                                    route.clone(),
                                    trade_type,
                                    bucket.percent,
                                    bucket.amount,
                                    raw,
                                    gas.units,
                                    gas.cost_in_quote_token,
                                    gas.cost_in_usd,
                                )))
                            }
                            Err(e) if e.is_unavailable() => {
                                tracing::trace!(
                                    %protocol,
                                    route = %route,
                                    percent = bucket.percent,
                                    "no quote: {}",
                                    e
                                );
                                Ok(None)
                            }
                            Err(QuoteError::Pricing { reason }) => Err(RouterError::Pricing {
                                protocol: protocol.to_string(),
                                reason,
                            }),
                            Err(e) => Err(RouterError::Pricing {
                                protocol: protocol.to_string(),
                                reason: e.to_string(),
                            }),
                        }
                    }
                })
                .buffered(max_concurrency.max(1))
                .collect::<Vec<_>>()
                .await)
        })
        .await?;

    let mut out = Vec::with_capacity(quoted.len());
    for q in quoted {
        if let Some(q) = q? {
            out.push(q);
        }
    }
    Ok(out)
}
