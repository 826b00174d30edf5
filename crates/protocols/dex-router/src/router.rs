//! Route enumeration
//!
//! Builds a token graph from candidate pools (pools are edges) and lists
//! every simple path from the input token to the output token.

use std::collections::{HashMap, HashSet};

use hubswap_core::{Protocol, Token};

use crate::state::{Pool, Route};

/// An edge in the pool graph: pool index plus the token it leads to.
#[derive(Debug, Clone, Copy)]
struct PoolEdge {
    pool: usize,
    token_out: usize,
}

/// Adjacency-list pool graph over interned tokens.
#[derive(Debug, Clone)]
pub struct PoolGraph<'a> {
    pools: &'a [Pool],
    tokens: Vec<&'a Token>,
    index: HashMap<&'a Token, usize>,
    adjacency: Vec<Vec<PoolEdge>>,
}

impl<'a> PoolGraph<'a> {
    pub fn build(pools: &'a [Pool]) -> Self {
        let mut graph = PoolGraph {
            pools,
            tokens: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
        };
        for (i, pool) in pools.iter().enumerate() {
            let a = graph.intern(&pool.token0);
            let b = graph.intern(&pool.token1);
            graph.adjacency[a].push(PoolEdge {
                pool: i,
                token_out: b,
            });
            graph.adjacency[b].push(PoolEdge {
                pool: i,
                token_out: a,
            });
        }
        graph
    }

    fn intern(&mut self, token: &'a Token) -> usize {
        if let Some(&i) = self.index.get(token) {
            return i;
        }
        let i = self.tokens.len();
        self.tokens.push(token);
        self.index.insert(token, i);
        self.adjacency.push(Vec::new());
        i
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// All acyclic paths from `source` to `target` of 1..=`max_hops` pools,
    /// in depth-first discovery order. No token and no pool repeats.
    pub fn find_paths(&self, source: &Token, target: &Token, max_hops: usize) -> Vec<Vec<usize>> {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return Vec::new();
        };
        let mut results = Vec::new();
        let mut path = Vec::new();
        let mut visited = HashSet::from([from]);
        self.walk(from, to, max_hops, &mut path, &mut visited, &mut results);
        results
    }

    fn walk(
        &self,
        current: usize,
        target: usize,
        max_hops: usize,
        path: &mut Vec<usize>,
        visited: &mut HashSet<usize>,
        results: &mut Vec<Vec<usize>>,
    ) {
        if path.len() >= max_hops {
            return;
        }
        for edge in &self.adjacency[current] {
            if path.contains(&edge.pool) || visited.contains(&edge.token_out) {
                continue;
            }
            path.push(edge.pool);
            if edge.token_out == target {
                results.push(path.clone());
            } else {
                visited.insert(edge.token_out);
                self.walk(edge.token_out, target, max_hops, path, visited, results);
                visited.remove(&edge.token_out);
            }
            path.pop();
        }
    }
}

/// Enumerate routes for one protocol.
///
/// Same-asset pairs (equal address and name) short-circuit to the identity
/// route without touching the graph.
pub fn enumerate_routes(
    protocol: Protocol,
    pools: &[Pool],
    token_in: &Token,
    token_out: &Token,
    max_hops: usize,
) -> Vec<Route> {
    if token_in.same_asset(token_out) {
        return vec![Route::identity(token_in)];
    }

    let graph = PoolGraph::build(pools);
    graph
        .find_paths(token_in, token_out, max_hops)
        .into_iter()
        .map(|indices| {
            let mut token_path = vec![token_in.clone()];
            let mut route_pools = Vec::with_capacity(indices.len());
            for i in indices {
                let pool = &pools[i];
                let next = pool
                    .other(&token_path[token_path.len() - 1])
                    .cloned()
                    .unwrap_or_else(|| token_out.clone());
                route_pools.push(pool.clone());
                token_path.push(next);
            }
            Route::new(protocol, route_pools, token_path)
        })
        .collect()
}
