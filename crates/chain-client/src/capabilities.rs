//! Provider capability detection
//!
//! Probes whether the provider is reachable and how many pool reads it
//! accepts per round trip.

use serde::{Deserialize, Serialize};

use crate::provider::ChainDataProvider;

/// Capability tier based on batching support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CapabilityTier {
    /// Any number of reads in one call
    Multicall,
    /// Bounded batches
    Chunked,
    /// One read per call
    Sequential,
}

impl CapabilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multicall => "Multicall",
            Self::Chunked => "Chunked",
            Self::Sequential => "Sequential",
        }
    }
}

/// Provider capabilities detected through probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainCapabilities {
    pub is_online: bool,
    pub block_number: u64,
    pub max_batch_size: Option<usize>,
    pub capability_tier: CapabilityTier,
}

impl ChainCapabilities {
    /// Assumed when the probe has not run yet.
    pub fn unknown() -> Self {
        Self {
            is_online: false,
            block_number: 0,
            max_batch_size: Some(1),
            capability_tier: CapabilityTier::Sequential,
        }
    }

    /// Addresses per `pool_states` call.
    pub fn chunk_size(&self, total: usize) -> usize {
        match self.max_batch_size {
            Some(n) => n.max(1),
            None => total.max(1),
        }
    }
}

fn tier_for(max_batch_size: Option<usize>) -> CapabilityTier {
    match max_batch_size {
        None => CapabilityTier::Multicall,
        Some(n) if n > 1 => CapabilityTier::Chunked,
        Some(_) => CapabilityTier::Sequential,
    }
}

/// Detect provider capabilities
pub async fn detect_capabilities(provider: &dyn ChainDataProvider) -> ChainCapabilities {
    let max_batch_size = provider.max_batch_size();
    match provider.block_number().await {
        Ok(block_number) => ChainCapabilities {
            is_online: true,
            block_number,
            max_batch_size,
            capability_tier: tier_for(max_batch_size),
        },
        Err(e) => {
            tracing::warn!(chain = %provider.chain_id(), "capability probe failed: {}", e);
            ChainCapabilities {
                is_online: false,
                block_number: 0,
                max_batch_size,
                capability_tier: tier_for(max_batch_size),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_tier_serialization() {
        assert_eq!(CapabilityTier::Multicall.as_str(), "Multicall");
        assert_eq!(tier_for(None), CapabilityTier::Multicall);
        assert_eq!(tier_for(Some(50)), CapabilityTier::Chunked);
        assert_eq!(tier_for(Some(1)), CapabilityTier::Sequential);
    }

    #[test]
    fn test_chunk_size() {
        let caps = ChainCapabilities {
            is_online: true,
            block_number: 1,
            max_batch_size: None,
            capability_tier: CapabilityTier::Multicall,
        };
        assert_eq!(caps.chunk_size(40), 40);
        assert_eq!(ChainCapabilities::unknown().chunk_size(40), 1);
    }
}
