//! Relay-chain vault liquidity
//!
//! A bridged transfer can only be released on the destination chain if the
//! relay-chain vault for that asset holds enough balance toward it.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use hubswap_core::{ChainId, Decimal, RequestContext, Result, RouterError, Token, ZERO_ADDRESS};

use crate::registry::{BridgeError, BridgeRegistry};

/// Vault balance releasable on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultBalance {
    /// Destination-chain token the vault releases
    pub token: Token,
    pub balance: u128,
    /// Decimals `balance` is expressed in (the relay token's)
    pub decimals: u8,
}

impl VaultBalance {
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from_base_units(self.balance, self.decimals)
    }

    /// Whether the vault covers `amount` given in `decimals` base units.
    pub fn covers(&self, amount: u128, decimals: u8) -> bool {
        has_liquidity(amount, decimals, self.balance, self.decimals)
    }
}

/// Compare across decimal counts by scaling the smaller-decimal side up.
pub fn has_liquidity(required: u128, required_decimals: u8, available: u128, available_decimals: u8) -> bool {
    let ten = BigUint::from(10u32);
    let mut required = BigUint::from(required);
    let mut available = BigUint::from(available);
    if required_decimals < available_decimals {
        required *= ten.pow((available_decimals - required_decimals) as u32);
    } else {
        available *= ten.pow((required_decimals - available_decimals) as u32);
    }
    available >= required
}

/// Resolve the vault for `from_token` and read its balance toward `to_chain`.
pub async fn get_vault_balance(
    ctx: &RequestContext,
    registry: &dyn BridgeRegistry,
    from_token: &Token,
    to_chain: ChainId,
) -> Result<VaultBalance> {
    ctx.run(async {
        resolve_vault_balance(registry, from_token, to_chain)
            .await
            .map_err(RouterError::from)
    })
    .await
}

async fn resolve_vault_balance(
    registry: &dyn BridgeRegistry,
    from_token: &Token,
    to_chain: ChainId,
) -> std::result::Result<VaultBalance, BridgeError> {
    let relay_token = if from_token.chain_id.is_relay() {
        from_token.wrapped()
    } else {
        registry.get_relay_chain_token(from_token).await?
    };

    let vault = registry.get_vault_token(&relay_token).await?;
    if vault == ZERO_ADDRESS {
        return Err(BridgeError::VaultNotFound {
            token: relay_token.address.clone(),
        });
    }

    let balance = registry.vault_balance(&vault, to_chain).await?;
    let token = registry
        .get_to_chain_token(&relay_token, to_chain)
        .await?
        .ok_or_else(|| BridgeError::NoTargetToken {
            token: relay_token.address.clone(),
            chain: to_chain.to_string(),
        })?;

    tracing::debug!(%vault, %to_chain, balance, token = %token, "vault balance");
    Ok(VaultBalance {
        token,
        balance,
        decimals: relay_token.decimals,
    })
}
