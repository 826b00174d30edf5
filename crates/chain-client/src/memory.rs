//! In-memory chain data, served from a fixed snapshot

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use hubswap_core::ChainId;

use crate::provider::{ChainDataProvider, ChainError, PoolState};

/// Provider backed by a map of pool states.
///
/// `fail_next` makes the next N calls fail with a transport error, which is
/// how retry behaviour is exercised without a network.
pub struct StaticChainData {
    chain_id: ChainId,
    states: DashMap<String, PoolState>,
    gas_price: AtomicU64,
    block_number: AtomicU64,
    max_batch_size: Option<usize>,
    pending_failures: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl StaticChainData {
    pub fn new(chain_id: ChainId, gas_price: u64) -> Self {
        Self {
            chain_id,
            states: DashMap::new(),
            gas_price: AtomicU64::new(gas_price),
            block_number: AtomicU64::new(1),
            max_batch_size: None,
            pending_failures: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = Some(size);
        self
    }

    pub fn set_state(&self, address: impl Into<String>, state: PoolState) {
        self.states
            .insert(hubswap_core::normalize_address(&address.into()), state);
    }

    pub fn set_reserves(&self, address: impl Into<String>, reserve0: u128, reserve1: u128) {
        self.set_state(address, PoolState::Reserves { reserve0, reserve1 });
    }

    pub fn fail_next(&self, calls: usize) {
        self.pending_failures.store(calls, Ordering::SeqCst);
    }

    /// Number of `pool_states` round trips served so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), ChainError> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(ChainError::Transport {
                message: "injected failure".to_string(),
            }),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl ChainDataProvider for StaticChainData {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn pool_states(
        &self,
        addresses: &[String],
    ) -> Result<Vec<Option<PoolState>>, ChainError> {
        self.take_failure()?;
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_batch_size {
            if addresses.len() > max {
                return Err(ChainError::Format {
                    message: format!("batch of {} exceeds limit {}", addresses.len(), max),
                });
            }
        }
        Ok(addresses
            .iter()
            .map(|a| self.states.get(a).map(|s| s.clone()))
            .collect())
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.take_failure()?;
        Ok(self.gas_price.load(Ordering::SeqCst) as u128)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.take_failure()?;
        Ok(self.block_number.load(Ordering::SeqCst))
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }
}
