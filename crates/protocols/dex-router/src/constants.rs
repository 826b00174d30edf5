//! Router Constants
//!
//! Base tokens, fee defaults and gas parameters per chain.

use hubswap_core::{ChainId, Protocol, Token};

/// Fee parameters
pub mod fees {
    /// Fee tiers are expressed in hundredths of a basis point
    pub const FEE_DENOM: u32 = 1_000_000;

    /// 0.3%
    pub const DEFAULT_FEE_PPM: u32 = 3_000;

    /// 0.25%
    pub const PANCAKE_FEE_PPM: u32 = 2_500;
}

/// Gas unit constants
pub mod gas {
    /// Concentrated liquidity
    pub const BASE_SWAP_COST: u64 = 2_000;

    /// Arbitrum charges L1 calldata on top of execution
    pub const BASE_SWAP_COST_ARBITRUM: u64 = 5_000;

    pub const COST_PER_HOP: u64 = 80_000;

    /// Concentrated-liquidity pools cross initialized ticks
    pub const COST_PER_INIT_TICK: u64 = 31_000;

    /// Constant-product pairs
    pub const V2_BASE_SWAP_COST: u64 = 135_000;
    pub const V2_COST_PER_EXTRA_HOP: u64 = 50_000;

    /// Curve and Ref
    pub const STABLE_BASE_SWAP_COST: u64 = 180_000;
    pub const STABLE_COST_PER_EXTRA_HOP: u64 = 120_000;

    /// USD values are truncated to this many decimals
    pub const USD_DECIMALS: u32 = 18;
}

/// Swap fee of a pool with no explicit tier.
pub fn default_fee_ppm(protocol: Protocol) -> u32 {
    match protocol {
        Protocol::PancakeSwap => fees::PANCAKE_FEE_PPM,
        _ => fees::DEFAULT_FEE_PPM,
    }
}

/// Well-connected tokens used to bridge thin pairs in candidate selection.
pub fn base_tokens(chain_id: ChainId) -> Vec<Token> {
    let raw: &[(&str, u8, &str)] = match chain_id {
        ChainId::ETHEREUM => &[
            ("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 18, "WETH"),
            ("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6, "USDC"),
            ("0xdac17f958d2ee523a2206206994597c13d831ec7", 6, "USDT"),
            ("0x6b175474e89094c44da98b954eedeac495271d0f", 18, "DAI"),
        ],
        ChainId::BSC => &[
            ("0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c", 18, "WBNB"),
            ("0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", 18, "USDC"),
            ("0x55d398326f99059ff775485246999027b3197955", 18, "USDT"),
            ("0xe9e7cea3dedca5984780bafc599bd69add087d56", 18, "BUSD"),
        ],
        ChainId::POLYGON => &[
            ("0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270", 18, "WMATIC"),
            ("0x2791bca1f2de4661ed88a30c99a7a9449aa84174", 6, "USDC"),
            ("0xc2132d05d31c914a87c6611c10748aeb04b58e8f", 6, "USDT"),
            ("0x7ceb23fd6bc0add59e62ac25578270cff1b9f619", 18, "WETH"),
        ],
        ChainId::MAP => &[
            ("0x05ab928d446d8ce6761e368c8e7be03c3168a9ec", 18, "WMAP"),
            ("0x9f722b2cb30093f766221fd0d37964949ed66918", 18, "USDC"),
        ],
        ChainId::Near => &[
            ("wrap.near", 24, "WNEAR"),
            (
                "a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near",
                6,
                "USDC",
            ),
        ],
        _ => &[],
    };
    raw.iter()
        .map(|(address, decimals, symbol)| {
            Token::new(chain_id, *address, *decimals, *symbol, *symbol)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_tokens_are_normalized() {
        let tokens = base_tokens(ChainId::ETHEREUM);
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| t.address == t.address.to_lowercase()));
        assert!(base_tokens(ChainId::ARBITRUM).is_empty());
    }

    #[test]
    fn test_default_fee() {
        assert_eq!(default_fee_ppm(Protocol::PancakeSwap), 2_500);
        assert_eq!(default_fee_ppm(Protocol::UniswapV2), 3_000);
    }
}
