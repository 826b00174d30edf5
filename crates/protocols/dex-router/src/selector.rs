//! Candidate pool selection
//!
//! Narrows a protocol's pool snapshot to the pools plausibly useful for one
//! swap, using TVL-ranked buckets around the two endpoint tokens.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use hubswap_core::{normalize_address, Decimal, ProtocolPoolSelection, Result, Token};

use crate::state::{Pool, PoolIds};

/// Transfer behaviour of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Ok,
    FeeOnTransfer,
    NotTransferable,
}

impl TokenStatus {
    pub fn is_flagged(&self) -> bool {
        !matches!(self, TokenStatus::Ok)
    }
}

#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &Token) -> Result<TokenStatus>;
}

/// Validator answering from a fixed deny list; unknown tokens are `Ok`.
#[derive(Default)]
pub struct StaticTokenValidator {
    flagged: DashMap<Token, TokenStatus>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self, token: Token, status: TokenStatus) {
        self.flagged.insert(token, status);
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &Token) -> Result<TokenStatus> {
        Ok(self
            .flagged
            .get(token)
            .map(|s| *s.value())
            .unwrap_or(TokenStatus::Ok))
    }
}

/// Which heuristic contributed a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionBucket {
    TopByTvl,
    DirectSwap,
    TokenIn,
    TokenOut,
    TokenInSecondHop,
    TokenOutSecondHop,
    BaseToken,
}

/// Deduplicated candidates plus the bucket record (observability only)
#[derive(Debug, Clone, Default)]
pub struct CandidatePools {
    pub pools: Vec<Pool>,
    pub sources: BTreeMap<SelectionBucket, Vec<String>>,
}

impl CandidatePools {
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Lower-case addresses and drop pools below `min_tvl` or trading a token
/// against itself.
pub fn sanitize_pools(pools: &[Pool], min_tvl: &Decimal) -> Vec<Pool> {
    pools
        .iter()
        .filter(|p| p.tvl_usd >= *min_tvl)
        .map(|p| {
            let mut pool = p.clone();
            pool.address = normalize_address(&pool.address);
            pool.token0.address = normalize_address(&pool.token0.address);
            pool.token1.address = normalize_address(&pool.token1.address);
            pool
        })
        .filter(|p| p.token0 != p.token1)
        .collect()
}

struct Collector<'a> {
    ids: &'a PoolIds,
    seen: HashSet<String>,
    out: CandidatePools,
}

impl<'a> Collector<'a> {
    fn add(&mut self, bucket: SelectionBucket, pools: &[&Pool]) {
        for pool in pools {
            let id = self.ids.id_for(pool);
            self.out.sources.entry(bucket).or_default().push(id.clone());
            if self.seen.insert(id) {
                self.out.pools.push((*pool).clone());
            }
        }
    }

    fn contains(&self, pool: &Pool) -> bool {
        self.seen.contains(&self.ids.id_for(pool))
    }
}

fn top<'a>(pools: impl Iterator<Item = &'a Pool>, n: usize) -> Vec<&'a Pool> {
    pools.take(n).collect()
}

/// Select candidate pools for `token_in` -> `token_out`.
///
/// `pools` should already be sanitized. Pools touching a flagged token are
/// dropped unless that token is one of the endpoints.
pub fn select_candidate_pools(
    pools: &[Pool],
    token_in: &Token,
    token_out: &Token,
    base_tokens: &[Token],
    statuses: &HashMap<Token, TokenStatus>,
    config: &ProtocolPoolSelection,
    ids: &PoolIds,
) -> CandidatePools {
    let is_excluded = |token: &Token| {
        token != token_in
            && token != token_out
            && statuses.get(token).map(|s| s.is_flagged()).unwrap_or(false)
    };

    let mut ranked: Vec<&Pool> = pools
        .iter()
        .filter(|p| !is_excluded(&p.token0) && !is_excluded(&p.token1))
        .collect();
    ranked.sort_by(|a, b| {
        b.tvl_usd
            .cmp(&a.tvl_usd)
            .then_with(|| a.address.cmp(&b.address))
    });

    let mut collector = Collector {
        ids,
        seen: HashSet::new(),
        out: CandidatePools::default(),
    };

    let top_by_tvl = top(ranked.iter().copied(), config.top_n);
    collector.add(SelectionBucket::TopByTvl, &top_by_tvl);

    let direct = top(
        ranked
            .iter()
            .copied()
            .filter(|p| p.connects(token_in, token_out)),
        config.top_n_direct_swaps,
    );
    collector.add(SelectionBucket::DirectSwap, &direct);

    let with_in = top(
        ranked.iter().copied().filter(|p| p.involves(token_in)),
        config.top_n_token_in_out,
    );
    collector.add(SelectionBucket::TokenIn, &with_in);

    let with_out = top(
        ranked.iter().copied().filter(|p| p.involves(token_out)),
        config.top_n_token_in_out,
    );
    collector.add(SelectionBucket::TokenOut, &with_out);

    for (bucket, first_hop, endpoint) in [
        (SelectionBucket::TokenInSecondHop, &with_in, token_in),
        (SelectionBucket::TokenOutSecondHop, &with_out, token_out),
    ] {
        let hop_tokens: HashSet<&Token> = first_hop
            .iter()
            .filter_map(|p| p.other(endpoint))
            .filter(|t| *t != token_in && *t != token_out)
            .collect();
        let second = top(
            ranked
                .iter()
                .copied()
                .filter(|p| !collector.contains(p) && hop_tokens.iter().any(|t| p.involves(t))),
            config.top_n_second_hop,
        );
        collector.add(bucket, &second);
    }

    let mut with_base: Vec<&Pool> = Vec::new();
    for base in base_tokens {
        for endpoint in [token_in, token_out] {
            if base == endpoint {
                continue;
            }
            with_base.extend(top(
                ranked
                    .iter()
                    .copied()
                    .filter(|p| p.connects(endpoint, base)),
                config.top_n_with_each_base_token,
            ));
        }
    }
    let mut seen_base = HashSet::new();
    with_base.retain(|p| seen_base.insert(p.address.clone()));
    with_base.sort_by(|a, b| {
        b.tvl_usd
            .cmp(&a.tvl_usd)
            .then_with(|| a.address.cmp(&b.address))
    });
    with_base.truncate(config.top_n_with_base_token);
    collector.add(SelectionBucket::BaseToken, &with_base);

    collector.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubswap_core::{ChainId, Protocol};
    use std::time::Duration;

    fn make_token(addr: &str, symbol: &str) -> Token {
        Token::new(ChainId::ETHEREUM, addr, 18, symbol, symbol)
    }

    fn make_pool(addr: &str, a: &Token, b: &Token, tvl: u128) -> Pool {
        Pool {
            address: addr.to_string(),
            protocol: Protocol::UniswapV2,
            token0: a.clone(),
            token1: b.clone(),
            fee_tier: None,
            tvl_usd: Decimal::from_integer(tvl),
        }
    }

    fn small_config() -> ProtocolPoolSelection {
        ProtocolPoolSelection {
            top_n: 1,
            top_n_direct_swaps: 1,
            top_n_token_in_out: 1,
            top_n_second_hop: 1,
            top_n_with_each_base_token: 1,
            top_n_with_base_token: 1,
            min_tvl: Decimal::zero(),
        }
    }

    #[test]
    fn test_sanitize_drops_low_tvl_and_lowercases() {
        let a = make_token("0x0A", "A");
        let b = make_token("0x0B", "B");
        let mut pool = make_pool("0xPOOL", &a, &b, 10);
        pool.token0.address = "0x0A".to_string();
        let pools = vec![pool, make_pool("0xdust", &a, &b, 1)];

        let out = sanitize_pools(&pools, &Decimal::from_integer(5));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].address, "0xpool");
        assert_eq!(out[0].token0.address, "0x0a");
    }

    #[test]
    fn test_buckets_and_dedupe() {
        let tin = make_token("0x01", "IN");
        let tout = make_token("0x02", "OUT");
        let mid = make_token("0x03", "MID");
        let base = make_token("0x04", "USDC");
        let other = make_token("0x05", "X");

        let pools = vec![
            make_pool("0xbig", &other, &base, 1_000),
            make_pool("0xdirect", &tin, &tout, 500),
            make_pool("0xinmid", &tin, &mid, 400),
            make_pool("0xmidx", &mid, &other, 300),
            make_pool("0xinbase", &tin, &base, 200),
            make_pool("0xunused", &other, &mid, 10),
        ];
        let ids = PoolIds::new(Duration::from_secs(60));
        let config = ProtocolPoolSelection {
            top_n_token_in_out: 2,
            ..small_config()
        };
        let cands =
            select_candidate_pools(&pools, &tin, &tout, &[base], &HashMap::new(), &config, &ids);

        let addrs: Vec<&str> = cands.pools.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(
            addrs,
            vec!["0xbig", "0xdirect", "0xinmid", "0xmidx", "0xinbase"]
        );
        assert_eq!(cands.sources[&SelectionBucket::TokenInSecondHop].len(), 1);
        // 0xdirect is both the direct pool and the top token-in/out pool
        assert_eq!(cands.sources[&SelectionBucket::TokenOut].len(), 1);
        assert!(!addrs.contains(&"0xunused"));
    }

    #[test]
    fn test_flagged_tokens_excluded_unless_endpoint() {
        let tin = make_token("0x01", "IN");
        let tout = make_token("0x02", "OUT");
        let fot = make_token("0x03", "FOT");
        let pools = vec![
            make_pool("0xa", &tin, &fot, 100),
            make_pool("0xb", &fot, &tout, 100),
            make_pool("0xc", &tin, &tout, 50),
        ];
        let mut statuses = HashMap::new();
        statuses.insert(fot.clone(), TokenStatus::FeeOnTransfer);
        let ids = PoolIds::new(Duration::from_secs(60));

        let cands = select_candidate_pools(
            &pools,
            &tin,
            &tout,
            &[],
            &statuses,
            &ProtocolPoolSelection::default(),
            &ids,
        );
        let addrs: Vec<&str> = cands.pools.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(addrs, vec!["0xc"]);

        // Same token as an endpoint is kept
        let cands = select_candidate_pools(
            &pools,
            &fot,
            &tout,
            &[],
            &statuses,
            &ProtocolPoolSelection::default(),
            &ids,
        );
        assert_eq!(cands.len(), 3);
    }

    #[test]
    fn test_empty_snapshot_is_valid() {
        let ids = PoolIds::new(Duration::from_secs(60));
        let cands = select_candidate_pools(
            &[],
            &make_token("0x01", "IN"),
            &make_token("0x02", "OUT"),
            &[],
            &HashMap::new(),
            &ProtocolPoolSelection::default(),
            &ids,
        );
        assert!(cands.is_empty());
    }
}
