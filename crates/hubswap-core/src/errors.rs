//! Error types for Hubswap

use thiserror::Error;

use crate::types::Leg;

/// Errors surfaced by route discovery and cross-chain composition
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    #[error("Chain {chain} is not supported")]
    UnsupportedChain { chain: String },

    #[error("fromChainId and toChainId cannot be the same ({chain})")]
    SameChain { chain: String },

    #[error("No route found in {leg} leg: {reason}")]
    NoRouteFound { leg: Leg, reason: String },

    #[error("Insufficient vault liquidity in {leg} leg: need {required}, have {available}")]
    InsufficientLiquidity {
        leg: Leg,
        required: String,
        available: String,
    },

    #[error("Bridge fee lookup failed: {reason}")]
    BridgeFeeLookup { reason: String },

    #[error("Vault lookup failed: {reason}")]
    VaultLookup { reason: String },

    #[error("Pricing failed for {protocol}: {reason}")]
    Pricing { protocol: String, reason: String },

    #[error("USD price unavailable: {reason}")]
    PriceOracle { reason: String },

    #[error("{operation} failed after {attempts} attempt(s): {reason}")]
    TransientIo {
        operation: String,
        attempts: usize,
        reason: String,
    },

    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Hubswap operations
pub type Result<T> = std::result::Result<T, RouterError>;

impl RouterError {
    /// Machine-checkable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedChain { .. } => "unsupported_chain",
            Self::SameChain { .. } => "same_chain",
            Self::NoRouteFound { .. } => "no_route_found",
            Self::InsufficientLiquidity { .. } => "insufficient_liquidity",
            Self::BridgeFeeLookup { .. } => "bridge_fee_lookup_failure",
            Self::VaultLookup { .. } => "vault_lookup_failure",
            Self::Pricing { .. } => "pricing_failure",
            Self::PriceOracle { .. } => "price_oracle_failure",
            Self::TransientIo { .. } => "transient_io_error",
            Self::Validation { .. } => "validation_error",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Config(_) => "config_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::SameChain { .. } | Self::UnsupportedChain { .. } => {
                400
            }
            Self::NoRouteFound { .. } | Self::InsufficientLiquidity { .. } => 422,
            Self::BridgeFeeLookup { .. }
            | Self::VaultLookup { .. }
            | Self::Pricing { .. }
            | Self::PriceOracle { .. }
            | Self::TransientIo { .. } => 503,
            Self::DeadlineExceeded => 504,
            Self::Cancelled => 499,
            Self::Config(_) => 500,
        }
    }

    /// Only I/O failures are worth another attempt; business outcomes never are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientIo { .. })
    }

    /// The cross-chain leg this error belongs to, if any.
    pub fn leg(&self) -> Option<Leg> {
        match self {
            Self::NoRouteFound { leg, .. } | Self::InsufficientLiquidity { leg, .. } => Some(*leg),
            _ => None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = RouterError::SameChain {
            chain: "56".into(),
        };
        assert_eq!(err.kind(), "same_chain");
        assert_eq!(err.status_code(), 400);

        let err = RouterError::InsufficientLiquidity {
            leg: Leg::Target,
            required: "100".into(),
            available: "50".into(),
        };
        assert_eq!(err.kind(), "insufficient_liquidity");
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.leg(), Some(Leg::Target));
    }

    #[test]
    fn test_only_io_is_retryable() {
        let io = RouterError::TransientIo {
            operation: "get_pool_states".into(),
            attempts: 1,
            reason: "timeout".into(),
        };
        assert!(io.is_retryable());
        assert!(!RouterError::NoRouteFound {
            leg: Leg::Source,
            reason: "no pools".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_message_names_leg() {
        let err = RouterError::NoRouteFound {
            leg: Leg::Source,
            reason: "no quoted routes".into(),
        };
        assert_eq!(err.to_string(), "No route found in source leg: no quoted routes");
    }
}
