//! Configuration types for Hubswap

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;
use crate::errors::{Result, RouterError};
use crate::types::{ChainId, Protocol};

/// Search-space limits for one same-chain route search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Maximum pools per route
    #[serde(default = "default_max_swaps_per_path")]
    pub max_swaps_per_path: usize,

    #[serde(default = "default_min_splits")]
    pub min_splits: usize,

    #[serde(default = "default_max_splits")]
    pub max_splits: usize,

    /// Bucket granularity in percent; must divide 100
    #[serde(default = "default_distribution_percent")]
    pub distribution_percent: u32,

    /// Require a split plan to draw from more than one protocol
    #[serde(default)]
    pub force_cross_protocol: bool,

    /// Upper bound on in-flight quote requests per protocol
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_swaps_per_path() -> usize {
    3
}

fn default_min_splits() -> usize {
    1
}

fn default_max_splits() -> usize {
    3
}

fn default_distribution_percent() -> u32 {
    5
}

fn default_max_concurrency() -> usize {
    16
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_swaps_per_path: default_max_swaps_per_path(),
            min_splits: default_min_splits(),
            max_splits: default_max_splits(),
            distribution_percent: default_distribution_percent(),
            force_cross_protocol: false,
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<()> {
        let dp = self.distribution_percent;
        if dp == 0 || dp > 100 || 100 % dp != 0 {
            return Err(RouterError::Config(format!(
                "distribution_percent {} must divide 100",
                dp
            )));
        }
        if self.max_swaps_per_path == 0 {
            return Err(RouterError::Config(
                "max_swaps_per_path must be at least 1".to_string(),
            ));
        }
        if self.min_splits == 0 || self.min_splits > self.max_splits {
            return Err(RouterError::Config(format!(
                "split bounds {}..={} are invalid",
                self.min_splits, self.max_splits
            )));
        }
        Ok(())
    }
}

/// How many pools each candidate-selection bucket contributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolPoolSelection {
    pub top_n: usize,
    pub top_n_direct_swaps: usize,
    pub top_n_token_in_out: usize,
    pub top_n_second_hop: usize,
    pub top_n_with_each_base_token: usize,
    pub top_n_with_base_token: usize,
    /// Pools below this TVL are dropped from the snapshot
    #[serde(default = "default_min_tvl")]
    pub min_tvl: Decimal,
}

fn default_min_tvl() -> Decimal {
    Decimal::zero()
}

impl Default for ProtocolPoolSelection {
    fn default() -> Self {
        Self {
            top_n: 10,
            top_n_direct_swaps: 2,
            top_n_token_in_out: 8,
            top_n_second_hop: 6,
            top_n_with_each_base_token: 2,
            top_n_with_base_token: 6,
            min_tvl: default_min_tvl(),
        }
    }
}

/// Backoff for transient chain reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_attempts")]
    pub attempts: usize,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_attempts() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Pool state and pool address entries
    #[serde(default = "default_pool_ttl_secs")]
    pub pool_ttl_secs: u64,
    /// Candidate pool sets per token pair
    #[serde(default = "default_candidate_ttl_secs")]
    pub candidate_ttl_secs: u64,
}

fn default_pool_ttl_secs() -> u64 {
    300
}

fn default_candidate_ttl_secs() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            pool_ttl_secs: default_pool_ttl_secs(),
            candidate_ttl_secs: default_candidate_ttl_secs(),
        }
    }
}

/// Per-chain routing setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub protocols: Vec<Protocol>,
    /// Gas price served by the fixture-backed chain provider
    #[serde(default)]
    pub gas_price_wei: u128,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Overall deadline for one request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub pool_selection: ProtocolPoolSelection,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default = "default_chains")]
    pub chains: Vec<ChainConfig>,
}

fn default_api_port() -> u16 {
    18080
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_chains() -> Vec<ChainConfig> {
    vec![
        ChainConfig {
            chain_id: ChainId::ETHEREUM,
            protocols: vec![Protocol::UniswapV2, Protocol::UniswapV3, Protocol::SushiSwap],
            gas_price_wei: 30_000_000_000,
        },
        ChainConfig {
            chain_id: ChainId::BSC,
            protocols: vec![Protocol::PancakeSwap],
            gas_price_wei: 5_000_000_000,
        },
        ChainConfig {
            chain_id: ChainId::POLYGON,
            protocols: vec![Protocol::QuickSwap, Protocol::UniswapV3, Protocol::SushiSwap],
            gas_price_wei: 50_000_000_000,
        },
        ChainConfig {
            chain_id: ChainId::MAP,
            protocols: vec![Protocol::HiveSwap],
            gas_price_wei: 100_000_000_000,
        },
        ChainConfig {
            chain_id: ChainId::Near,
            protocols: vec![Protocol::Ref],
            gas_price_wei: 100_000_000,
        },
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            request_timeout_ms: default_request_timeout_ms(),
            routing: RoutingConfig::default(),
            pool_selection: ProtocolPoolSelection::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            chains: default_chains(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Config(format!("{}: {}", path.display(), e)))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| RouterError::Config(format!("{}: {}", path.display(), e)))?;
        config.routing.validate()?;
        Ok(config)
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }
}
