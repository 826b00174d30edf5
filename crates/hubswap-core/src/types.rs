//! Core type definitions for Hubswap

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chains;
use crate::errors::RouterError;

/// Symbolic chain id used by the bridge for NEAR.
pub const NEAR_CHAIN_ID: &str = "5566818579631833088";

/// Legacy numeric id some callers still send for NEAR.
const NEAR_LEGACY_NUMERIC_ID: u64 = 1_313_161_554;

/// Placeholder address for a chain's native currency.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Chain identity, normalized at the boundary.
///
/// EVM chains carry their numeric id. Non-EVM chains get their own variant
/// so that identity checks never depend on string/number coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChainId {
    Evm(u64),
    Near,
}

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId::Evm(1);
    pub const BSC: ChainId = ChainId::Evm(56);
    pub const POLYGON: ChainId = ChainId::Evm(137);
    pub const ARBITRUM: ChainId = ChainId::Evm(42161);
    pub const MAP: ChainId = ChainId::Evm(22776);

    /// Parse a chain id as received from a caller.
    pub fn parse(raw: &str) -> Result<Self, RouterError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("near") || trimmed == NEAR_CHAIN_ID {
            return Ok(ChainId::Near);
        }
        match trimmed.parse::<u64>() {
            Ok(NEAR_LEGACY_NUMERIC_ID) => Ok(ChainId::Near),
            Ok(id) => Ok(ChainId::Evm(id)),
            Err(_) => Err(RouterError::Validation {
                message: format!("invalid chain id '{}'", raw),
            }),
        }
    }

    pub fn is_relay(&self) -> bool {
        *self == chains::RELAY_CHAIN
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Evm(id) => write!(f, "{}", id),
            ChainId::Near => f.write_str(NEAR_CHAIN_ID),
        }
    }
}

impl FromStr for ChainId {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainId::parse(s)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => ChainId::parse(&n.to_string()),
            Raw::Str(s) => ChainId::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// A token on a specific chain.
///
/// Equality and hashing use `(chain_id, address)` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub chain_id: ChainId,
    pub address: String,
    pub decimals: u8,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

impl Token {
    pub fn new(
        chain_id: ChainId,
        address: impl Into<String>,
        decimals: u8,
        symbol: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            address: normalize_address(&address.into()),
            decimals,
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Whether this token is the native-currency placeholder.
    pub fn is_native(&self) -> bool {
        self.address == ZERO_ADDRESS
    }

    /// Resolve the native placeholder to the chain's wrapped token.
    pub fn wrapped(&self) -> Token {
        if self.is_native() {
            if let Some(wrapped) = chains::wrapped_native(self.chain_id) {
                return wrapped;
            }
        }
        self.clone()
    }

    /// Same underlying asset: identical chain and address, and identical
    /// names when both sides carry one.
    pub fn same_asset(&self, other: &Token) -> bool {
        self == other
            && (self.name.is_empty() || other.name.is_empty() || self.name == other.name)
    }

    /// Short label for logs and route strings.
    pub fn label(&self) -> &str {
        if self.symbol.is_empty() {
            &self.address
        } else {
            &self.symbol
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.label(), self.chain_id)
    }
}

/// EVM addresses are case-insensitive; NEAR account ids are already lowercase.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Liquidity venue family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "V2")]
    UniswapV2,
    #[serde(rename = "V3")]
    UniswapV3,
    #[serde(rename = "QUICKSWAP")]
    QuickSwap,
    #[serde(rename = "SUSHISWAP")]
    SushiSwap,
    #[serde(rename = "PANCAKESWAP")]
    PancakeSwap,
    #[serde(rename = "CURVE")]
    Curve,
    #[serde(rename = "REF")]
    Ref,
    #[serde(rename = "HIVESWAP")]
    HiveSwap,
}

impl Protocol {
    pub const ALL: [Protocol; 8] = [
        Protocol::UniswapV2,
        Protocol::UniswapV3,
        Protocol::QuickSwap,
        Protocol::SushiSwap,
        Protocol::PancakeSwap,
        Protocol::Curve,
        Protocol::Ref,
        Protocol::HiveSwap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::UniswapV2 => "V2",
            Protocol::UniswapV3 => "V3",
            Protocol::QuickSwap => "QUICKSWAP",
            Protocol::SushiSwap => "SUSHISWAP",
            Protocol::PancakeSwap => "PANCAKESWAP",
            Protocol::Curve => "CURVE",
            Protocol::Ref => "REF",
            Protocol::HiveSwap => "HIVESWAP",
        }
    }

    /// Concentrated-liquidity venues cross ticks when swapping.
    pub fn is_concentrated(&self) -> bool {
        matches!(self, Protocol::UniswapV3)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Protocol::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == upper || (upper == "MAP_DEX" && *p == Protocol::HiveSwap))
            .ok_or_else(|| RouterError::Validation {
                message: format!("unknown protocol '{}'", s),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

/// Which leg of a cross-chain plan an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Source,
    Relay,
    Target,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Leg::Source => "source",
            Leg::Relay => "relay",
            Leg::Target => "target",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_parse() {
        assert_eq!(ChainId::parse("1").unwrap(), ChainId::ETHEREUM);
        assert_eq!(ChainId::parse(" 22776 ").unwrap(), ChainId::MAP);
        assert_eq!(ChainId::parse(NEAR_CHAIN_ID).unwrap(), ChainId::Near);
        assert_eq!(ChainId::parse("1313161554").unwrap(), ChainId::Near);
        assert_eq!(ChainId::parse("near").unwrap(), ChainId::Near);
        assert!(ChainId::parse("mainnet").is_err());
    }

    #[test]
    fn test_chain_id_serde() {
        let json = serde_json::to_string(&ChainId::Near).unwrap();
        assert_eq!(json, format!("\"{}\"", NEAR_CHAIN_ID));

        let from_num: ChainId = serde_json::from_str("137").unwrap();
        assert_eq!(from_num, ChainId::POLYGON);
        let from_str: ChainId = serde_json::from_str("\"56\"").unwrap();
        assert_eq!(from_str, ChainId::BSC);
    }

    #[test]
    fn test_token_equality_ignores_metadata() {
        let a = Token::new(ChainId::BSC, "0xABC", 18, "USDC", "USD Coin");
        let b = Token::new(ChainId::BSC, "0xabc", 6, "", "");
        let c = Token::new(ChainId::ETHEREUM, "0xabc", 18, "USDC", "USD Coin");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_native_resolves_to_wrapped() {
        let eth = Token::new(ChainId::ETHEREUM, ZERO_ADDRESS, 18, "ETH", "Ether");
        let wrapped = eth.wrapped();
        assert_eq!(wrapped.symbol, "WETH");
        assert!(!wrapped.is_native());
    }

    #[test]
    fn test_same_asset_needs_address_and_name() {
        let usdc = Token::new(ChainId::POLYGON, "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359", 6, "USDC", "USD Coin");
        let usdce = Token::new(ChainId::POLYGON, "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", 6, "USDC.e", "USD Coin");
        assert!(!usdc.same_asset(&usdce));

        let bare = Token::new(ChainId::POLYGON, "0x3C499C542CEF5E3811E1192CE70D8CC03D5C3359", 6, "", "");
        assert!(usdc.same_asset(&bare));

        let renamed = Token::new(ChainId::POLYGON, usdc.address.as_str(), 6, "USDC", "Bridged USDC");
        assert!(!usdc.same_asset(&renamed));
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("v3".parse::<Protocol>().unwrap(), Protocol::UniswapV3);
        assert_eq!("MAP_DEX".parse::<Protocol>().unwrap(), Protocol::HiveSwap);
        assert!("balancer".parse::<Protocol>().is_err());
    }
}
