//! chain-client: Batched, retried chain reads with capability detection
//!
//! This crate wraps a [`ChainDataProvider`] with per-call timeouts, bounded
//! retries for transient failures and batch chunking sized by the
//! provider's probed capabilities.

pub mod capabilities;
pub mod memory;
pub mod provider;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use hubswap_core::{retry_async, ChainId, RequestContext, Result, RetryPolicy, RouterError};
use tokio::sync::RwLock;

pub use capabilities::{CapabilityTier, ChainCapabilities};
pub use memory::StaticChainData;
pub use provider::{ChainDataProvider, ChainError, PoolState};

/// Default timeout for a single provider call.
pub const CHAIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Block reads retry twice, backing off from 100ms up to 1s.
const BLOCK_NUMBER_RETRY: RetryPolicy = RetryPolicy {
    attempts: 3,
    initial_delay: Duration::from_millis(100),
    max_delay: Duration::from_millis(1000),
};

/// High-level chain client with capability detection
#[derive(Clone)]
pub struct ChainClient {
    inner: Arc<dyn ChainDataProvider>,
    capabilities: Arc<RwLock<Option<ChainCapabilities>>>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ChainClient {
    /// Create a new client with capability probing
    pub async fn new(
        provider: Arc<dyn ChainDataProvider>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        let client = Self::new_without_probe(provider, retry, timeout);
        client.refresh_capabilities().await;
        client
    }

    /// Create without probing (for testing or when the chain may be offline)
    pub fn new_without_probe(
        provider: Arc<dyn ChainDataProvider>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: provider,
            capabilities: Arc::new(RwLock::new(None)),
            retry,
            timeout,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.inner.chain_id()
    }

    /// Get the underlying provider (for advanced usage)
    pub fn inner(&self) -> &dyn ChainDataProvider {
        self.inner.as_ref()
    }

    /// Refresh capability detection
    pub async fn refresh_capabilities(&self) {
        let caps = capabilities::detect_capabilities(self.inner.as_ref()).await;
        tracing::debug!(
            chain = %self.chain_id(),
            tier = caps.capability_tier.as_str(),
            "probed chain capabilities"
        );
        let mut lock = self.capabilities.write().await;
        *lock = Some(caps);
    }

    /// Get current capabilities (may be stale if not recently refreshed)
    pub async fn capabilities(&self) -> Option<ChainCapabilities> {
        let lock = self.capabilities.read().await;
        lock.clone()
    }

    pub async fn block_number(&self, ctx: &RequestContext) -> Result<u64> {
        self.call(ctx, "block_number", &BLOCK_NUMBER_RETRY, || self.inner.block_number())
            .await
    }

    pub async fn gas_price(&self, ctx: &RequestContext) -> Result<u128> {
        self.call(ctx, "gas_price", &BLOCK_NUMBER_RETRY, || self.inner.gas_price())
            .await
    }

    /// Read pool states in as few round trips as the provider allows.
    ///
    /// Addresses the chain does not know are left out of the result.
    pub async fn pool_states(
        &self,
        ctx: &RequestContext,
        addresses: &[String],
    ) -> Result<HashMap<String, PoolState>> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = addresses
            .iter()
            .map(|a| hubswap_core::normalize_address(a))
            .filter(|a| seen.insert(a.clone()))
            .collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let caps = self
            .capabilities()
            .await
            .unwrap_or_else(ChainCapabilities::unknown);
        let chunk_size = caps.chunk_size(unique.len());

        let reads = unique.chunks(chunk_size).map(|chunk| async move {
            let states = self
                .call(ctx, "pool_states", &self.retry, || self.inner.pool_states(chunk))
                .await?;
            if states.len() != chunk.len() {
                return Err(RouterError::TransientIo {
                    operation: "pool_states".to_string(),
                    attempts: 1,
                    reason: format!("expected {} results, got {}", chunk.len(), states.len()),
                });
            }
            Ok(chunk.iter().cloned().zip(states).collect::<Vec<_>>())
        });

        let mut out = HashMap::with_capacity(unique.len());
        for batch in join_all(reads).await {
            for (address, state) in batch? {
                match state {
                    Some(state) => {
                        out.insert(address, state);
                    }
                    None => tracing::debug!(chain = %self.chain_id(), %address, "pool not found"),
                }
            }
        }
        Ok(out)
    }

    async fn call<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        policy: &RetryPolicy,
        mut f: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ChainError>>,
    {
        let timeout = self.timeout;
        let chain = self.chain_id();
        ctx.run(async {
            let mut attempts = 0;
            let res = retry_async(
                |attempt| {
                    attempts = attempt;
                    timed_request(timeout, f())
                },
                policy,
                ChainError::is_transient,
            )
            .await;
            res.map_err(|e| match e {
                ChainError::Unsupported { chain } => RouterError::UnsupportedChain { chain },
                other => {
                    tracing::warn!(%chain, operation, attempts, "chain read failed: {}", other);
                    RouterError::TransientIo {
                        operation: operation.to_string(),
                        attempts,
                        reason: other.to_string(),
                    }
                }
            })
        })
        .await
    }
}

async fn timed_request<T>(
    timeout: Duration,
    fut: impl Future<Output = std::result::Result<T, ChainError>>,
) -> std::result::Result<T, ChainError> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| ChainError::Timeout {
            millis: timeout.as_millis() as u64,
        })?
}
