//! Cross-chain plan and its swap-step response shape

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bridge::{BridgeFee, VaultBalance};
use dex_router::{RouteWithQuote, SwapPlan};
use hubswap_core::{ChainId, Decimal, Token};

/// A composed cross-chain swap.
///
/// `relay_leg` is always present. When the source chain is the relay chain
/// it carries the relay-side routing and `source_leg` is empty; when the
/// destination is the relay chain it carries the final routing and
/// `target_leg` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainPlan {
    pub request_id: Uuid,
    pub source_leg: Option<SwapPlan>,
    pub relay_leg: SwapPlan,
    pub target_leg: Option<SwapPlan>,
    pub bridge_fee: BridgeFee,
    /// Amount released after the fee, in base units of the bridged token
    pub bridged_amount: u128,
    pub vault: Option<VaultBalance>,
}

/// Token as shown to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub icon: String,
}

/// One pool hop inside a swap step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathHop {
    pub id: String,
    pub token_in: TokenInfo,
    pub token_out: TokenInfo,
}

/// One quoted route of a leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapStep {
    pub chain_id: String,
    pub dex_name: String,
    pub amount_in: String,
    pub amount_out: String,
    pub token_in: TokenInfo,
    pub token_out: TokenInfo,
    pub path: Vec<PathHop>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_chain: Option<Vec<SwapStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_chain: Option<Vec<SwapStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_chain: Option<Vec<SwapStep>>,
}

/// Icon URLs keyed by chain and address. Unknown tokens get an empty icon.
#[derive(Debug, Clone, Default)]
pub struct TokenIcons {
    icons: HashMap<(ChainId, String), String>,
}

impl TokenIcons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chain_id: ChainId, address: &str, url: impl Into<String>) {
        self.icons
            .insert((chain_id, hubswap_core::normalize_address(address)), url.into());
    }

    pub fn icon_for(&self, token: &Token) -> String {
        self.icons
            .get(&(token.chain_id, token.address.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn token_info(&self, token: &Token) -> TokenInfo {
        TokenInfo {
            address: token.address.clone(),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            icon: self.icon_for(token),
        }
    }
}

/// Pool hops of a quoted route, in token-path order.
pub fn path_hops(route: &RouteWithQuote, icons: &TokenIcons) -> Vec<PathHop> {
    let path = &route.route.token_path;
    route
        .route
        .pools
        .iter()
        .enumerate()
        .map(|(i, pool)| PathHop {
            id: pool.address.clone(),
            token_in: icons.token_info(&path[i]),
            token_out: icons.token_info(&path[i + 1]),
        })
        .collect()
}

/// Caller-facing steps of one leg.
///
/// `display_in` / `display_out` replace the leg's endpoint addresses, so a
/// native-currency request shows the address the caller sent rather than
/// the wrapped token it was routed as.
pub fn leg_steps(
    plan: &SwapPlan,
    icons: &TokenIcons,
    display_in: Option<&str>,
    display_out: Option<&str>,
) -> Vec<SwapStep> {
    let mut token_in = icons.token_info(&plan.token_in);
    let mut token_out = icons.token_info(&plan.token_out);
    if let Some(address) = display_in {
        token_in.address = address.to_string();
    }
    if let Some(address) = display_out {
        token_out.address = address.to_string();
    }

    plan.routes
        .iter()
        .map(|r| SwapStep {
            chain_id: plan.token_in.chain_id.to_string(),
            dex_name: r.route.dex_name().to_string(),
            amount_in: Decimal::from_base_units(r.amount_in(), plan.token_in.decimals).to_string(),
            amount_out: Decimal::from_base_units(r.amount_out(), plan.token_out.decimals).to_string(),
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            path: path_hops(r, icons),
        })
        .collect()
}

impl CrossChainPlan {
    /// Response keyed by chain role. Source and target endpoints show the
    /// caller's own token addresses.
    pub fn to_response(&self, icons: &TokenIcons, token_in: &str, token_out: &str) -> CrossChainResponse {
        let relay_display_in = self.source_leg.is_none().then_some(token_in);
        let relay_display_out = self.target_leg.is_none().then_some(token_out);
        CrossChainResponse {
            src_chain: self
                .source_leg
                .as_ref()
                .map(|p| leg_steps(p, icons, Some(token_in), None)),
            map_chain: Some(leg_steps(
                &self.relay_leg,
                icons,
                relay_display_in,
                relay_display_out,
            )),
            target_chain: self
                .target_leg
                .as_ref()
                .map(|p| leg_steps(p, icons, None, Some(token_out))),
        }
    }
}
