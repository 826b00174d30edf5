//! Collaborator wiring
//!
//! Every configured chain gets an in-memory chain provider, a pool snapshot
//! and a flagged-token list filled from the fixtures, then a `SwapRouter`
//! over them. All routers feed one cross-chain orchestrator.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use bridge::{FeeRate, InMemoryBridgeRegistry, TokenMap};
use chain_client::{ChainClient, StaticChainData, CHAIN_REQUEST_TIMEOUT};
use cross_chain::{CrossChainOrchestrator, TokenIcons};
use dex_router::{PoolIds, StaticPoolSnapshot, StaticTokenValidator, StaticUsdOracle, SwapRouter};
use hubswap_api::AppState;
use hubswap_core::{normalize_address, AppConfig, ChainId, RetryPolicy, Token};

use crate::fixtures::{parse_units, BridgeFixture, Fixtures};

fn build_registry(token_map: TokenMap, bridge: &BridgeFixture) -> anyhow::Result<InMemoryBridgeRegistry> {
    let registry = InMemoryBridgeRegistry::new(token_map);
    for fee in &bridge.fee_rates {
        let rate = FeeRate {
            lowest: parse_units("lowest", &fee.lowest)?,
            highest: parse_units("highest", &fee.highest)?,
            rate: parse_units("rate", &fee.rate)?,
        };
        registry.set_fee_rate(&fee.relay_token, fee.to_chain, rate);
    }
    for vault in &bridge.vaults {
        registry.set_vault(&vault.relay_token, &vault.vault);
        for (chain, balance) in &vault.balances {
            let chain = ChainId::parse(chain)?;
            registry.set_vault_balance(&vault.vault, chain, parse_units("balance", balance)?);
        }
    }
    Ok(registry)
}

/// Build the API state from configuration and fixtures.
pub async fn build_state(config: AppConfig, fixtures: Fixtures) -> anyhow::Result<AppState> {
    let token_map = fixtures.token_map.clone().unwrap_or_else(TokenMap::mainnet);
    let registry = build_registry(token_map.clone(), &fixtures.bridge)?;

    let oracle = Arc::new(StaticUsdOracle::new());
    let pool_ids = Arc::new(PoolIds::new(Duration::from_secs(config.cache.pool_ttl_secs)));
    pool_ids.start_cleanup();
    let retry = RetryPolicy::from(&config.retry);

    let mut orchestrator = CrossChainOrchestrator::new(Arc::new(registry), Arc::new(token_map));
    for chain in &config.chains {
        let gas_price = u64::try_from(chain.gas_price_wei).unwrap_or(u64::MAX);
        let data = Arc::new(StaticChainData::new(chain.chain_id, gas_price));
        let snapshot = Arc::new(StaticPoolSnapshot::new());
        let validator = StaticTokenValidator::new();

        if let Some(fixture) = fixtures.chain(chain.chain_id) {
            for entry in &fixture.pools {
                let mut pool = entry.pool.clone();
                pool.token0.address = normalize_address(&pool.token0.address);
                pool.token1.address = normalize_address(&pool.token1.address);
                let reserve0 = parse_units("reserve0", &entry.reserve0)
                    .with_context(|| format!("pool {}", pool.address))?;
                let reserve1 = parse_units("reserve1", &entry.reserve1)
                    .with_context(|| format!("pool {}", pool.address))?;
                data.set_reserves(pool.address.clone(), reserve0, reserve1);
                snapshot.add_pool(pool);
            }
            for (address, rate) in &fixture.usd_rates {
                oracle.set_rate(chain.chain_id, address, rate.clone());
            }
            for (address, status) in &fixture.flagged_tokens {
                let token = Token::new(chain.chain_id, address.as_str(), 0, "", "");
                validator.flag(token, *status);
            }
        }

        let client = ChainClient::new(data, retry, CHAIN_REQUEST_TIMEOUT).await;
        let router = SwapRouter::new(
            client,
            chain.protocols.clone(),
            snapshot,
            oracle.clone(),
            config.routing.clone(),
            config.pool_selection.clone(),
            Duration::from_secs(config.cache.candidate_ttl_secs),
            pool_ids.clone(),
        )
        .with_validator(Arc::new(validator));
        router.start_cache_cleanup();
        tracing::info!(
            chain = %chain.chain_id,
            protocols = chain.protocols.len(),
            "router ready"
        );
        orchestrator = orchestrator.with_router(Arc::new(router));
    }

    Ok(AppState::new(config, Arc::new(orchestrator), TokenIcons::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubswap_core::{RequestContext, Token, TradeType};

    const SAMPLE: &str = r#"{
        "chains": [{
            "chainId": 56,
            "pools": [{
                "address": "0xB1",
                "protocol": "PANCAKESWAP",
                "token0": {"chainId": 56, "address": "0x8AC76A51CC950D9822D68B83FE1AD97B32CD580D", "decimals": 18, "symbol": "USDC"},
                "token1": {"chainId": 56, "address": "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", "decimals": 18, "symbol": "CAKE"},
                "tvlUsd": "2000000",
                "reserve0": "1000000000000000000000000",
                "reserve1": "500000000000000000000000"
            }],
            "usdRates": {
                "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c": "300",
                "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82": "2"
            }
        }],
        "bridge": {
            "vaults": [{
                "relayToken": "0x9f722b2cb30093f766221fd0d37964949ed66918",
                "vault": "0xaa",
                "balances": {"56": "5", "near": "7"}
            }]
        }
    }"#;

    #[tokio::test]
    async fn test_build_state_routes_fixture_pools() {
        let fixtures = Fixtures::from_json(SAMPLE).unwrap();
        let state = build_state(AppConfig::default(), fixtures).await.unwrap();

        assert!(state.router(ChainId::ETHEREUM).is_some());
        let bsc = state.router(ChainId::BSC).unwrap();
        let usdc = Token::new(ChainId::BSC, "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", 18, "USDC", "");
        let cake = Token::new(ChainId::BSC, "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", 18, "CAKE", "");
        let plan = bsc
            .route(&RequestContext::background(), &usdc, &cake, 1_000_000_000_000_000_000, TradeType::ExactInput)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plan.routes[0].route.pools[0].address, "0xb1");
    }

    const FLAGGED: &str = r#"{
        "chains": [{
            "chainId": 56,
            "pools": [
                {
                    "address": "0xD1",
                    "protocol": "PANCAKESWAP",
                    "token0": {"chainId": 56, "address": "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", "decimals": 18, "symbol": "USDC"},
                    "token1": {"chainId": 56, "address": "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", "decimals": 18, "symbol": "CAKE"},
                    "tvlUsd": "100000",
                    "reserve0": "50000000000000000000000",
                    "reserve1": "25000000000000000000000"
                },
                {
                    "address": "0xF1",
                    "protocol": "PANCAKESWAP",
                    "token0": {"chainId": 56, "address": "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", "decimals": 18, "symbol": "USDC"},
                    "token1": {"chainId": 56, "address": "0x00000000000000000000000000000000000000AA", "decimals": 18, "symbol": "TAX"},
                    "tvlUsd": "90000000",
                    "reserve0": "90000000000000000000000000",
                    "reserve1": "90000000000000000000000000"
                },
                {
                    "address": "0xF2",
                    "protocol": "PANCAKESWAP",
                    "token0": {"chainId": 56, "address": "0x00000000000000000000000000000000000000aa", "decimals": 18, "symbol": "TAX"},
                    "token1": {"chainId": 56, "address": "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", "decimals": 18, "symbol": "CAKE"},
                    "tvlUsd": "90000000",
                    "reserve0": "90000000000000000000000000",
                    "reserve1": "45000000000000000000000000"
                }
            ],
            "usdRates": {
                "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c": "300",
                "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82": "2"
            },
            "flaggedTokens": {
                "0x00000000000000000000000000000000000000AA": "FEE_ON_TRANSFER"
            }
        }]
    }"#;

    #[tokio::test]
    async fn test_fixture_flagged_tokens_reach_router() {
        let fixtures = Fixtures::from_json(FLAGGED).unwrap();
        let state = build_state(AppConfig::default(), fixtures).await.unwrap();

        let bsc = state.router(ChainId::BSC).unwrap();
        let usdc = Token::new(ChainId::BSC, "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", 18, "USDC", "");
        let cake = Token::new(ChainId::BSC, "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82", 18, "CAKE", "");
        let plan = bsc
            .route(&RequestContext::background(), &usdc, &cake, 1_000_000_000_000_000_000, TradeType::ExactInput)
            .await
            .unwrap()
            .unwrap();
        for r in &plan.routes {
            assert!(r.route.pools.iter().all(|p| p.address == "0xd1"));
        }
    }

    #[test]
    fn test_bad_amount_is_reported() {
        let bridge = BridgeFixture {
            fee_rates: vec![crate::fixtures::FeeRateFixture {
                relay_token: "0x9f72".to_string(),
                to_chain: ChainId::BSC,
                lowest: "one".to_string(),
                highest: "1".to_string(),
                rate: "1".to_string(),
            }],
            vaults: Vec::new(),
        };
        let err = build_registry(TokenMap::mainnet(), &bridge).unwrap_err();
        assert!(err.to_string().contains("lowest"));
    }
}
