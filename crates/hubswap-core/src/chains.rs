//! Supported chains and their native-currency metadata

use crate::types::{ChainId, Token};

/// The hub chain every cross-chain transfer is bridged through.
pub const RELAY_CHAIN: ChainId = ChainId::MAP;

/// Static chain metadata
#[derive(Debug, Clone, Copy)]
pub struct ChainInfo {
    pub id: ChainId,
    pub name: &'static str,
    pub native_symbol: &'static str,
    pub native_decimals: u8,
    pub wrapped_address: &'static str,
    pub wrapped_symbol: &'static str,
    pub wrapped_name: &'static str,
}

/// Mainnets accepted by the router.
pub const SUPPORTED_CHAINS: &[ChainInfo] = &[
    ChainInfo {
        id: ChainId::ETHEREUM,
        name: "mainnet",
        native_symbol: "ETH",
        native_decimals: 18,
        wrapped_address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        wrapped_symbol: "WETH",
        wrapped_name: "Wrapped Ether",
    },
    ChainInfo {
        id: ChainId::BSC,
        name: "binance-mainnet",
        native_symbol: "BNB",
        native_decimals: 18,
        wrapped_address: "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c",
        wrapped_symbol: "WBNB",
        wrapped_name: "Wrapped BNB",
    },
    ChainInfo {
        id: ChainId::POLYGON,
        name: "polygon-mainnet",
        native_symbol: "MATIC",
        native_decimals: 18,
        wrapped_address: "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270",
        wrapped_symbol: "WMATIC",
        wrapped_name: "Wrapped MATIC",
    },
    ChainInfo {
        id: ChainId::MAP,
        name: "map-mainnet",
        native_symbol: "MAP",
        native_decimals: 18,
        wrapped_address: "0x05ab928d446d8ce6761e368c8e7be03c3168a9ec",
        wrapped_symbol: "WMAP",
        wrapped_name: "Wrapped MAP",
    },
    ChainInfo {
        id: ChainId::Near,
        name: "near-mainnet",
        native_symbol: "NEAR",
        native_decimals: 24,
        wrapped_address: "wrap.near",
        wrapped_symbol: "wNEAR",
        wrapped_name: "Wrapped NEAR fungible token",
    },
];

pub fn chain_info(chain_id: ChainId) -> Option<&'static ChainInfo> {
    SUPPORTED_CHAINS.iter().find(|c| c.id == chain_id)
}

pub fn is_supported(chain_id: ChainId) -> bool {
    chain_info(chain_id).is_some()
}

/// Get human-readable display name for a chain
pub fn chain_display_name(chain_id: ChainId) -> String {
    match chain_info(chain_id) {
        Some(info) => info.name.to_string(),
        None => format!("chain-{}", chain_id),
    }
}

/// Wrapped token standing in for the native currency on `chain_id`.
pub fn wrapped_native(chain_id: ChainId) -> Option<Token> {
    chain_info(chain_id).map(|info| {
        Token::new(
            info.id,
            info.wrapped_address,
            info.native_decimals,
            info.wrapped_symbol,
            info.wrapped_name,
        )
    })
}
