//! Offline pool, price and bridge data
//!
//! Base-unit amounts are JSON strings since they routinely exceed 2^64.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use bridge::TokenMap;
use dex_router::{Pool, TokenStatus};
use hubswap_core::{ChainId, Decimal};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    #[serde(default)]
    pub chains: Vec<ChainFixture>,
    /// Replaces the built-in mainnet token map when present
    #[serde(default)]
    pub token_map: Option<TokenMap>,
    #[serde(default)]
    pub bridge: BridgeFixture,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainFixture {
    pub chain_id: ChainId,
    #[serde(default)]
    pub pools: Vec<PoolFixture>,
    /// USD price per whole token, keyed by token address
    #[serde(default)]
    pub usd_rates: HashMap<String, Decimal>,
    /// Tokens kept out of intermediate hops, keyed by token address
    #[serde(default)]
    pub flagged_tokens: HashMap<String, TokenStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolFixture {
    #[serde(flatten)]
    pub pool: Pool,
    pub reserve0: String,
    pub reserve1: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFixture {
    #[serde(default)]
    pub fee_rates: Vec<FeeRateFixture>,
    #[serde(default)]
    pub vaults: Vec<VaultFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRateFixture {
    pub relay_token: String,
    pub to_chain: ChainId,
    pub lowest: String,
    pub highest: String,
    pub rate: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultFixture {
    pub relay_token: String,
    pub vault: String,
    /// Releasable balance per destination chain id
    #[serde(default)]
    pub balances: HashMap<String, String>,
}

impl Fixtures {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixtures {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing fixtures {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainFixture> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }
}

/// Parse a base-unit amount.
pub fn parse_units(field: &str, raw: &str) -> anyhow::Result<u128> {
    raw.trim()
        .parse::<u128>()
        .with_context(|| format!("{}: '{}' is not a base-unit amount", field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"{
        "chains": [{
            "chainId": 56,
            "pools": [{
                "address": "0xB1",
                "protocol": "PANCAKESWAP",
                "token0": {"chainId": 56, "address": "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", "decimals": 18, "symbol": "USDC", "name": "USD Coin"},
                "token1": {"chainId": 56, "address": "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", "decimals": 18, "symbol": "CAKE"},
                "tvlUsd": "2000000",
                "reserve0": "1000000000000000000000000",
                "reserve1": "500000000000000000000000"
            }],
            "usdRates": {
                "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c": "300",
                "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d": 1,
                "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82": "2"
            }
        }],
        "bridge": {
            "feeRates": [{
                "relayToken": "0x9f722b2cb30093f766221fd0d37964949ed66918",
                "toChain": 56,
                "lowest": "1000000000000000000",
                "highest": "500000000000000000000",
                "rate": "2000"
            }],
            "vaults": [{
                "relayToken": "0x9f722b2cb30093f766221fd0d37964949ed66918",
                "vault": "0x00000000000000000000000000000000000000aa",
                "balances": {"56": "1000000000000000000000000"}
            }]
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let fixtures = Fixtures::from_json(SAMPLE).unwrap();
        let bsc = fixtures.chain(ChainId::BSC).unwrap();
        assert_eq!(bsc.pools.len(), 1);
        assert_eq!(bsc.pools[0].pool.token1.symbol, "CAKE");
        assert_eq!(
            parse_units("reserve0", &bsc.pools[0].reserve0).unwrap(),
            1_000_000 * 1_000_000_000_000_000_000
        );
        assert_eq!(bsc.usd_rates.len(), 3);
        assert!(fixtures.token_map.is_none());
        assert_eq!(fixtures.bridge.fee_rates[0].to_chain, ChainId::BSC);
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert!(parse_units("lowest", "1.5").is_err());
        assert!(parse_units("lowest", "-1").is_err());
    }
}
