//! Chain data collaborator interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubswap_core::ChainId;

/// On-chain pool state as read from the chain.
///
/// Constant-product venues expose plain reserves. Every other venue family
/// carries a protocol-specific payload that only its pricing capability
/// interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolState {
    Reserves { reserve0: u128, reserve1: u128 },
    Opaque { payload: serde_json::Value },
}

impl PoolState {
    pub fn reserves(&self) -> Option<(u128, u128)> {
        match self {
            PoolState::Reserves { reserve0, reserve1 } => Some((*reserve0, *reserve1)),
            PoolState::Opaque { .. } => None,
        }
    }
}

/// Errors from a single provider call
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("Request timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Malformed response: {message}")]
    Format { message: String },

    #[error("Chain {chain} is not served by this provider")]
    Unsupported { chain: String },
}

impl ChainError {
    /// Timeouts, transport and decoding hiccups are worth retrying.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ChainError::Unsupported { .. })
    }
}

/// Batched read access to one chain.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    fn chain_id(&self) -> ChainId;

    /// Read many pools in one round trip. The result is positional; `None`
    /// marks an address the chain knows nothing about.
    async fn pool_states(
        &self,
        addresses: &[String],
    ) -> Result<Vec<Option<PoolState>>, ChainError>;

    async fn gas_price(&self) -> Result<u128, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Largest batch one `pool_states` call accepts; `None` means unbounded.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}
