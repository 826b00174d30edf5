//! Best swap route search
//!
//! Chooses the set of quoted routes whose percents sum to 100 and whose
//! combined gas-adjusted quote is best. The search is exact: candidates
//! are pruned to the few that can appear in an optimal plan, then
//! combinations are enumerated depth-first with an upper bound.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use hubswap_core::{Protocol, RoutingConfig, Token, TradeType};

use crate::state::{RouteWithQuote, SwapPlan};

/// Search inputs beyond the quotes themselves
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub trade_type: TradeType,
    pub amount: u128,
    pub min_splits: usize,
    pub max_splits: usize,
    pub distribution_percent: u32,
    pub force_cross_protocol: bool,
}

impl SearchParams {
    pub fn new(config: &RoutingConfig, trade_type: TradeType, amount: u128) -> Self {
        Self {
            trade_type,
            amount,
            min_splits: config.min_splits,
            max_splits: config.max_splits,
            distribution_percent: config.distribution_percent,
            force_cross_protocol: config.force_cross_protocol,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    /// Position in the input; lower means discovered earlier
    discovery: usize,
    route: usize,
    protocol: Option<Protocol>,
    /// Percent in steps of `distribution_percent`
    units: usize,
    score: i128,
}

#[derive(Debug, Clone)]
struct Best {
    score: i128,
    picks: Vec<usize>,
}

impl Best {
    /// Higher score wins; then fewer routes; then earlier discovery.
    fn beats(&self, other: &Best, candidates: &[Candidate]) -> bool {
        match self.score.cmp(&other.score) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
        match self.picks.len().cmp(&other.picks.len()) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
        discovery_order(&self.picks, candidates) < discovery_order(&other.picks, candidates)
    }
}

fn discovery_order(picks: &[usize], candidates: &[Candidate]) -> Vec<usize> {
    let mut order: Vec<usize> = picks.iter().map(|&i| candidates[i].discovery).collect();
    order.sort_unstable();
    order
}

fn score(quote: &RouteWithQuote) -> i128 {
    match quote.trade_type {
        TradeType::ExactInput => quote.quote_adjusted_for_gas,
        TradeType::ExactOutput => quote.quote_adjusted_for_gas.saturating_neg(),
    }
}

/// Keep, per percent (and per protocol when cross-protocol splits are
/// forced), the `max_splits` best quotes. Any optimal plan can be rewritten
/// to use only these.
fn prune(mut candidates: Vec<Candidate>, params: &SearchParams) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.units
            .cmp(&a.units)
            .then_with(|| b.score.cmp(&a.score))
            .then_with(|| a.discovery.cmp(&b.discovery))
    });
    let mut kept: HashMap<(usize, Option<Protocol>), usize> = HashMap::new();
    candidates.retain(|c| {
        let group = if params.force_cross_protocol {
            (c.units, c.protocol)
        } else {
            (c.units, None)
        };
        let n = kept.entry(group).or_insert(0);
        *n += 1;
        *n <= params.max_splits
    });
    candidates
}

struct Search<'a> {
    candidates: &'a [Candidate],
    params: &'a SearchParams,
    /// bound[r][s]: best score reachable with `r` units left and `s` picks left
    bound: Vec<Vec<Option<i128>>>,
    best: Option<Best>,
}

impl<'a> Search<'a> {
    fn new(candidates: &'a [Candidate], params: &'a SearchParams, total_units: usize) -> Self {
        let mut best_at: BTreeMap<usize, i128> = BTreeMap::new();
        for c in candidates {
            let entry = best_at.entry(c.units).or_insert(c.score);
            *entry = (*entry).max(c.score);
        }

        let splits = params.max_splits;
        let mut bound = vec![vec![None; splits + 1]; total_units + 1];
        bound[0].iter_mut().for_each(|b| *b = Some(0));
        for r in 1..=total_units {
            for s in 1..=splits {
                let mut value: Option<i128> = None;
                for (&units, &score) in best_at.range(1..=r) {
                    if let Some(rest) = bound[r - units][s - 1] {
                        let total = score.saturating_add(rest);
                        value = Some(value.map_or(total, |v| v.max(total)));
                    }
                }
                bound[r][s] = value;
            }
        }

        Self {
            candidates,
            params,
            bound,
            best: None,
        }
    }

    fn run(&mut self, total_units: usize) {
        let mut picks = Vec::new();
        let mut routes = HashSet::new();
        self.walk(0, total_units, 0, &mut picks, &mut routes);
    }

    fn walk(
        &mut self,
        start: usize,
        remaining: usize,
        score: i128,
        picks: &mut Vec<usize>,
        routes: &mut HashSet<usize>,
    ) {
        if remaining == 0 {
            if picks.len() >= self.params.min_splits && self.protocols_ok(picks) {
                let candidate = Best {
                    score,
                    picks: picks.clone(),
                };
                let better = match &self.best {
                    Some(best) => candidate.beats(best, self.candidates),
                    None => true,
                };
                if better {
                    self.best = Some(candidate);
                }
            }
            return;
        }

        let picks_left = self.params.max_splits - picks.len();
        if picks_left == 0 {
            return;
        }
        match (self.bound[remaining][picks_left], &self.best) {
            (None, _) => return,
            (Some(ub), Some(best)) if score.saturating_add(ub) < best.score => return,
            _ => {}
        }

        let candidates = self.candidates;
        for (i, c) in candidates.iter().enumerate().skip(start) {
            if c.units > remaining || routes.contains(&c.route) {
                continue;
            }
            picks.push(i);
            routes.insert(c.route);
            self.walk(
                i + 1,
                remaining - c.units,
                score.saturating_add(c.score),
                picks,
                routes,
            );
            routes.remove(&c.route);
            picks.pop();
        }
    }

    fn protocols_ok(&self, picks: &[usize]) -> bool {
        if !self.params.force_cross_protocol || picks.len() < 2 {
            return true;
        }
        let protocols: HashSet<Option<Protocol>> =
            picks.iter().map(|&i| self.candidates[i].protocol).collect();
        protocols.len() > 1
    }
}

/// Find the best plan, or `None` when no combination covers 100%.
pub fn find_best_swap_route(
    quotes: &[RouteWithQuote],
    token_in: &Token,
    token_out: &Token,
    params: &SearchParams,
) -> Option<SwapPlan> {
    let step = params.distribution_percent;
    if quotes.is_empty() || step == 0 || 100 % step != 0 || params.max_splits == 0 {
        return None;
    }
    let total_units = (100 / step) as usize;

    let mut route_ids: HashMap<String, usize> = HashMap::new();
    let candidates: Vec<Candidate> = quotes
        .iter()
        .enumerate()
        .filter(|(_, q)| q.percent > 0 && q.percent % step == 0 && q.percent <= 100)
        .map(|(i, q)| {
            let next = route_ids.len();
            let route = *route_ids.entry(q.route.key()).or_insert(next);
            Candidate {
                discovery: i,
                route,
                protocol: q.route.protocol,
                units: (q.percent / step) as usize,
                score: score(q),
            }
        })
        .collect();

    let candidates = prune(candidates, params);
    let mut search = Search::new(&candidates, params, total_units);
    search.run(total_units);
    let best = search.best?;

    let mut chosen: Vec<RouteWithQuote> = best
        .picks
        .iter()
        .map(|&i| quotes[candidates[i].discovery].clone())
        .collect();
    chosen.sort_by(|a, b| b.percent.cmp(&a.percent));

    let assigned: u128 = chosen.iter().map(|q| q.amount).sum();
    if let Some(largest) = chosen.first_mut() {
        largest.amount += params.amount.saturating_sub(assigned);
    }

    tracing::debug!(
        routes = chosen.len(),
        score = best.score,
        "selected swap plan"
    );

    Some(SwapPlan {
        trade_type: params.trade_type,
        token_in: token_in.clone(),
        token_out: token_out.clone(),
        amount: params.amount,
        routes: chosen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Pool, Route};
    use hubswap_core::{ChainId, Decimal};

    fn make_token(addr: &str, symbol: &str) -> Token {
        Token::new(ChainId::ETHEREUM, addr, 18, symbol, symbol)
    }

    fn make_route(pool: &str, protocol: Protocol) -> Route {
        let a = make_token("0x0a", "A");
        let b = make_token("0x0b", "B");
        Route::new(
            protocol,
            vec![Pool {
                address: pool.to_string(),
                protocol,
                token0: a.clone(),
                token1: b.clone(),
                fee_tier: None,
                tvl_usd: Decimal::zero(),
            }],
            vec![a, b],
        )
    }

    fn make_quote(
        route: &Route,
        percent: u32,
        total: u128,
        raw: u128,
        gas: u128,
    ) -> RouteWithQuote {
        RouteWithQuote::new(
            route.clone(),
            TradeType::ExactInput,
            percent,
            total * percent as u128 / 100,
            raw,
            0,
            gas,
            Decimal::zero(),
        )
    }

    fn params(step: u32, max_splits: usize) -> SearchParams {
        SearchParams {
            trade_type: TradeType::ExactInput,
            amount: 1_000,
            min_splits: 1,
            max_splits,
            distribution_percent: step,
            force_cross_protocol: false,
        }
    }

    /// Concave quotes: out = 2 * pct - pct^2 / 100, scaled.
    fn concave(route: &Route, step: u32, scale: u128, gas: u128) -> Vec<RouteWithQuote> {
        (1..=100 / step)
            .map(|i| {
                let p = (i * step) as u128;
                make_quote(route, i * step, 1_000, scale * (2 * p * 100 - p * p), gas)
            })
            .collect()
    }

    fn a() -> Token {
        make_token("0x0a", "A")
    }

    fn b() -> Token {
        make_token("0x0b", "B")
    }

    #[test]
    fn test_empty_quotes_no_plan() {
        assert!(find_best_swap_route(&[], &a(), &b(), &params(5, 3)).is_none());
    }

    #[test]
    fn test_single_route_wins_when_split_gas_dominates() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV2);
        let mut quotes = concave(&r1, 25, 1, 1_000_000);
        quotes.extend(concave(&r2, 25, 1, 1_000_000));
        let plan = find_best_swap_route(&quotes, &a(), &b(), &params(25, 3)).unwrap();
        assert_eq!(plan.routes.len(), 1);
        assert_eq!(plan.routes[0].percent, 100);
        // equal quotes: earliest discovered route wins
        assert_eq!(plan.routes[0].route.pools[0].address, "0xp1");
    }

    #[test]
    fn test_equal_score_prefers_fewer_routes() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV3);
        let quotes = vec![
            make_quote(&r1, 50, 1_000, 500, 0),
            make_quote(&r2, 50, 1_000, 500, 0),
            make_quote(&r1, 100, 1_000, 1_000, 0),
        ];
        let plan = find_best_swap_route(&quotes, &a(), &b(), &params(50, 2)).unwrap();
        assert_eq!(plan.routes.len(), 1);
        assert_eq!(plan.routes[0].percent, 100);
        assert_eq!(plan.routes[0].route.pools[0].address, "0xp1");
        assert_eq!(plan.total_amount_out(), 1_000);
    }

    #[test]
    fn test_split_preferred_when_combined_total_is_better() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV3);
        let mut quotes = concave(&r1, 5, 1, 0);
        quotes.extend(concave(&r2, 5, 1, 0));
        let plan = find_best_swap_route(&quotes, &a(), &b(), &params(5, 3)).unwrap();

        assert_eq!(plan.routes.len(), 2);
        let percents: Vec<u32> = plan.routes.iter().map(|r| r.percent).collect();
        assert_eq!(percents, vec![50, 50]);
        assert!(plan.routes.iter().all(|r| r.percent % 5 == 0));
        assert_eq!(plan.routes.iter().map(|r| r.percent).sum::<u32>(), 100);
        assert_eq!(plan.total_amount_in(), 1_000);
    }

    #[test]
    fn test_remainder_goes_to_largest_route() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV2);
        let quotes = vec![
            make_quote(&r1, 60, 999, 700, 0),
            make_quote(&r2, 40, 999, 500, 0),
            make_quote(&r1, 100, 999, 1_000, 0),
        ];
        let mut p = params(20, 2);
        p.amount = 999;
        let plan = find_best_swap_route(&quotes, &a(), &b(), &p).unwrap();
        assert_eq!(plan.routes.len(), 2);
        // floor(999 * .6) + floor(999 * .4) = 599 + 399 = 998
        assert_eq!(plan.routes[0].percent, 60);
        assert_eq!(plan.routes[0].amount, 600);
        assert_eq!(plan.total_amount_in(), 999);
    }

    #[test]
    fn test_dominated_quote_does_not_change_plan() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV2);
        let r3 = make_route("0xp3", Protocol::UniswapV2);
        let mut quotes = concave(&r1, 10, 3, 0);
        quotes.extend(concave(&r2, 10, 2, 0));
        let before = find_best_swap_route(&quotes, &a(), &b(), &params(10, 3)).unwrap();

        // r3 loses money at every size once gas is counted
        quotes.extend(concave(&r3, 10, 1, 1_000_000));
        let after = find_best_swap_route(&quotes, &a(), &b(), &params(10, 3)).unwrap();

        let keys = |p: &SwapPlan| {
            p.routes
                .iter()
                .map(|r| (r.route.key(), r.percent))
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&before), keys(&after));
    }

    #[test]
    fn test_exact_output_minimizes_input() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV2);
        let mk = |route: &Route, raw: u128| {
            RouteWithQuote::new(
                route.clone(),
                TradeType::ExactOutput,
                100,
                1_000,
                raw,
                0,
                10,
                Decimal::zero(),
            )
        };
        let quotes = vec![mk(&r1, 1_200), mk(&r2, 1_100)];
        let mut p = params(100, 1);
        p.trade_type = TradeType::ExactOutput;
        let plan = find_best_swap_route(&quotes, &a(), &b(), &p).unwrap();
        assert_eq!(plan.routes[0].raw_quote, 1_100);
    }

    #[test]
    fn test_force_cross_protocol() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let r2 = make_route("0xp2", Protocol::UniswapV2);
        let r3 = make_route("0xp3", Protocol::SushiSwap);
        let quotes = vec![
            make_quote(&r1, 50, 1_000, 600, 0),
            make_quote(&r2, 50, 1_000, 590, 0),
            make_quote(&r3, 50, 1_000, 500, 0),
        ];
        let mut p = params(50, 2);
        p.min_splits = 2;

        let plan = find_best_swap_route(&quotes, &a(), &b(), &p).unwrap();
        let pools: Vec<&str> = plan
            .routes
            .iter()
            .map(|r| r.route.pools[0].address.as_str())
            .collect();
        assert_eq!(pools, vec!["0xp1", "0xp2"]);

        p.force_cross_protocol = true;
        let plan = find_best_swap_route(&quotes, &a(), &b(), &p).unwrap();
        let pools: Vec<&str> = plan
            .routes
            .iter()
            .map(|r| r.route.pools[0].address.as_str())
            .collect();
        assert_eq!(pools, vec!["0xp1", "0xp3"]);
    }

    #[test]
    fn test_no_combination_reaches_100() {
        let r1 = make_route("0xp1", Protocol::UniswapV2);
        let quotes = vec![make_quote(&r1, 50, 1_000, 600, 0)];
        assert!(find_best_swap_route(&quotes, &a(), &b(), &params(50, 3)).is_none());
    }
}
