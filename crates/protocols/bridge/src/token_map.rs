//! Relay-bridgeable token mapping
//!
//! Every bridgeable asset has one canonical token on the relay chain and a
//! mapped token on each chain it can be bridged to or from.

use serde::{Deserialize, Serialize};

use hubswap_core::{ChainId, Result, RouterError, Token, RELAY_CHAIN};

/// An asset with its relay-chain token and per-chain mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeToken {
    pub relay_token: Token,
    pub chain_tokens: Vec<Token>,
}

impl BridgeToken {
    pub fn on_chain(&self, chain_id: ChainId) -> Option<&Token> {
        if chain_id == self.relay_token.chain_id {
            return Some(&self.relay_token);
        }
        self.chain_tokens.iter().find(|t| t.chain_id == chain_id)
    }
}

/// Complete token map for the bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMap {
    pub tokens: Vec<BridgeToken>,
}

impl TokenMap {
    /// USDC mapped across the supported mainnets.
    pub fn mainnet() -> Self {
        let usdc = |chain_id, address: &str, decimals| {
            Token::new(chain_id, address, decimals, "USDC", "USD Coin")
        };
        TokenMap {
            tokens: vec![BridgeToken {
                relay_token: usdc(RELAY_CHAIN, "0x9f722b2cb30093f766221fd0d37964949ed66918", 18),
                chain_tokens: vec![
                    usdc(ChainId::ETHEREUM, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6),
                    usdc(ChainId::BSC, "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", 18),
                    usdc(ChainId::POLYGON, "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", 6),
                    usdc(
                        ChainId::Near,
                        "a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near",
                        6,
                    ),
                ],
            }],
        }
    }

    /// Parse a token map from JSON, lower-casing every address.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut map: TokenMap = serde_json::from_str(raw)
            .map_err(|e| RouterError::Config(format!("token map: {}", e)))?;
        for entry in &mut map.tokens {
            normalize(&mut entry.relay_token);
            entry.chain_tokens.iter_mut().for_each(normalize);
        }
        Ok(map)
    }

    /// Tokens on `chain_id` that can be bridged through the relay chain.
    pub fn bridgeable_tokens(&self, chain_id: ChainId) -> Vec<Token> {
        self.tokens
            .iter()
            .filter_map(|t| t.on_chain(chain_id).cloned())
            .collect()
    }

    /// The entry a chain token belongs to, matched by `(chain, address)`.
    pub fn entry_for(&self, token: &Token) -> Option<&BridgeToken> {
        self.tokens
            .iter()
            .find(|t| t.on_chain(token.chain_id) == Some(token))
    }

    /// The entry whose relay-chain token is `relay_token`.
    pub fn entry_for_relay(&self, relay_token: &Token) -> Option<&BridgeToken> {
        self.tokens.iter().find(|t| t.relay_token == *relay_token)
    }

    pub fn supported_chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self
            .tokens
            .iter()
            .flat_map(|t| {
                std::iter::once(t.relay_token.chain_id).chain(t.chain_tokens.iter().map(|c| c.chain_id))
            })
            .collect();
        chains.sort();
        chains.dedup();
        chains
    }
}

fn normalize(token: &mut Token) {
    token.address = hubswap_core::normalize_address(&token.address);
}
