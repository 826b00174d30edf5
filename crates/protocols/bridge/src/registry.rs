//! Bridge registry collaborator
//!
//! The relay chain's token register answers which relay token an asset maps
//! to, what bridging costs, and where its vault lives.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubswap_core::{normalize_address, ChainId, Decimal, RouterError, Token, ZERO_ADDRESS};

use crate::token_map::TokenMap;

/// Raw fee schedule for bridging a relay token to one chain.
///
/// `rate` is in hundredths of a basis point as stored by the register;
/// `lowest` and `highest` are in relay-token base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    pub lowest: u128,
    pub highest: u128,
    pub rate: u128,
}

/// Errors from registry lookups
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("Token {token} on chain {chain} has no relay-chain mapping")]
    UnmappedToken { chain: String, token: String },

    #[error("No fee rate for {token} to chain {chain}")]
    NoFeeRate { token: String, chain: String },

    #[error("Relay-chain amount for {token} is zero")]
    ZeroRelayAmount { token: String },

    #[error("Vault address not found for token {token}")]
    VaultNotFound { token: String },

    #[error("Cannot find corresponding token for {token} on chain {chain}")]
    NoTargetToken { token: String, chain: String },

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

impl BridgeError {
    pub fn is_vault_error(&self) -> bool {
        matches!(
            self,
            BridgeError::VaultNotFound { .. } | BridgeError::NoTargetToken { .. }
        )
    }
}

impl From<BridgeError> for RouterError {
    fn from(e: BridgeError) -> Self {
        if e.is_vault_error() {
            RouterError::VaultLookup {
                reason: e.to_string(),
            }
        } else {
            RouterError::BridgeFeeLookup {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
pub trait BridgeRegistry: Send + Sync {
    /// Relay-chain token that `token` is bridged as.
    async fn get_relay_chain_token(&self, token: &Token) -> Result<Token, BridgeError>;

    /// `amount` of `from_token` expressed in `relay_token` base units.
    async fn get_relay_chain_amount(
        &self,
        relay_token: &Token,
        from_token: &Token,
        amount: u128,
    ) -> Result<u128, BridgeError>;

    async fn get_fee_rate(&self, relay_token: &Token, to_chain: ChainId) -> Result<FeeRate, BridgeError>;

    /// Vault address for a relay token; the zero address when none exists.
    async fn get_vault_token(&self, relay_token: &Token) -> Result<String, BridgeError>;

    /// Releasable balance of `vault` toward `to_chain`, in relay-token base units.
    async fn vault_balance(&self, vault: &str, to_chain: ChainId) -> Result<u128, BridgeError>;

    /// Mapped token on `to_chain`, if the asset exists there.
    async fn get_to_chain_token(
        &self,
        relay_token: &Token,
        to_chain: ChainId,
    ) -> Result<Option<Token>, BridgeError>;
}

/// Registry served from a token map plus fixed fee and vault tables.
#[derive(Debug)]
pub struct InMemoryBridgeRegistry {
    token_map: TokenMap,
    fee_rates: DashMap<(String, ChainId), FeeRate>,
    vaults: DashMap<String, String>,
    balances: DashMap<(String, ChainId), u128>,
    calls: AtomicUsize,
}

impl InMemoryBridgeRegistry {
    pub fn new(token_map: TokenMap) -> Self {
        Self {
            token_map,
            fee_rates: DashMap::new(),
            vaults: DashMap::new(),
            balances: DashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn token_map(&self) -> &TokenMap {
        &self.token_map
    }

    pub fn set_fee_rate(&self, relay_token: &str, to_chain: ChainId, rate: FeeRate) {
        self.fee_rates
            .insert((normalize_address(relay_token), to_chain), rate);
    }

    pub fn set_vault(&self, relay_token: &str, vault: &str) {
        self.vaults
            .insert(normalize_address(relay_token), normalize_address(vault));
    }

    pub fn set_vault_balance(&self, vault: &str, to_chain: ChainId, balance: u128) {
        self.balances.insert((normalize_address(vault), to_chain), balance);
    }

    /// Lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BridgeRegistry for InMemoryBridgeRegistry {
    async fn get_relay_chain_token(&self, token: &Token) -> Result<Token, BridgeError> {
        self.record();
        self.token_map
            .entry_for(token)
            .map(|e| e.relay_token.clone())
            .ok_or_else(|| BridgeError::UnmappedToken {
                chain: token.chain_id.to_string(),
                token: token.address.clone(),
            })
    }

    async fn get_relay_chain_amount(
        &self,
        relay_token: &Token,
        from_token: &Token,
        amount: u128,
    ) -> Result<u128, BridgeError> {
        self.record();
        Decimal::from_base_units(amount, from_token.decimals)
            .to_base_units(relay_token.decimals)
            .map_err(|e| BridgeError::Unavailable(e.to_string()))
    }

    async fn get_fee_rate(&self, relay_token: &Token, to_chain: ChainId) -> Result<FeeRate, BridgeError> {
        self.record();
        self.fee_rates
            .get(&(relay_token.address.clone(), to_chain))
            .map(|r| *r.value())
            .ok_or_else(|| BridgeError::NoFeeRate {
                token: relay_token.address.clone(),
                chain: to_chain.to_string(),
            })
    }

    async fn get_vault_token(&self, relay_token: &Token) -> Result<String, BridgeError> {
        self.record();
        Ok(self
            .vaults
            .get(&relay_token.address)
            .map(|v| v.value().clone())
            .unwrap_or_else(|| ZERO_ADDRESS.to_string()))
    }

    async fn vault_balance(&self, vault: &str, to_chain: ChainId) -> Result<u128, BridgeError> {
        self.record();
        Ok(self
            .balances
            .get(&(normalize_address(vault), to_chain))
            .map(|b| *b.value())
            .unwrap_or(0))
    }

    async fn get_to_chain_token(
        &self,
        relay_token: &Token,
        to_chain: ChainId,
    ) -> Result<Option<Token>, BridgeError> {
        self.record();
        Ok(self
            .token_map
            .entry_for_relay(relay_token)
            .and_then(|e| e.on_chain(to_chain).cloned()))
    }
}
