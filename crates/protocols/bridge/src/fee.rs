//! Bridge fee estimation
//!
//! The register stores a percentage rate plus lower and upper bounds per
//! relay token and destination chain. Fees are always computed on the
//! relay-chain amount; a fee for a token on another chain is scaled back
//! into that token's base units.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use hubswap_core::{ChainId, Decimal, RequestContext, Result, RouterError, Token};

use crate::registry::{BridgeError, BridgeRegistry, FeeRate};

/// Register rates are hundredths of a basis point.
pub const RATE_DENOMINATOR: u128 = 100 * 10_000;

/// Fee charged for one bridge transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFee {
    pub fee_token: Token,
    /// Base units of `fee_token`
    pub amount: u128,
    /// Bounds expressed in `fee_token` base units
    pub fee_rate: FeeRate,
}

impl BridgeFee {
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from_base_units(self.amount, self.fee_token.decimals)
    }
}

/// `clamp(amount * rate / 10000, lowest, highest)` in relay-token units.
pub fn fee_amount(amount: u128, rate: &FeeRate) -> u128 {
    let raw = BigUint::from(amount) * BigUint::from(rate.rate) / BigUint::from(RATE_DENOMINATOR);
    let fee = raw.to_u128().unwrap_or(u128::MAX);
    if fee > rate.highest {
        rate.highest
    } else if fee < rate.lowest {
        rate.lowest
    } else {
        fee
    }
}

/// `value * numerator / denominator`, floored.
fn scale(value: u128, numerator: u128, denominator: u128) -> u128 {
    if denominator.is_zero() {
        return 0;
    }
    (BigUint::from(value) * BigUint::from(numerator) / BigUint::from(denominator))
        .to_u128()
        .unwrap_or(u128::MAX)
}

async fn lookup<T>(
    ctx: &RequestContext,
    fut: impl std::future::Future<Output = std::result::Result<T, BridgeError>>,
) -> Result<T> {
    ctx.run(async { fut.await.map_err(RouterError::from) }).await
}

/// Fee for bridging `amount` of `token` to `to_chain`, in `token` units.
pub async fn estimate_bridge_fee(
    ctx: &RequestContext,
    registry: &dyn BridgeRegistry,
    token: &Token,
    amount: u128,
    to_chain: ChainId,
) -> Result<BridgeFee> {
    if token.chain_id.is_relay() {
        let relay_token = token.wrapped();
        let rate = lookup(ctx, registry.get_fee_rate(&relay_token, to_chain)).await?;
        let fee = fee_amount(amount, &rate);
        tracing::debug!(token = %relay_token, %to_chain, amount, fee, "bridge fee on relay chain");
        return Ok(BridgeFee {
            fee_token: relay_token,
            amount: fee,
            fee_rate: rate,
        });
    }

    let relay_token = lookup(ctx, registry.get_relay_chain_token(token)).await?;
    let relay_amount = lookup(ctx, registry.get_relay_chain_amount(&relay_token, token, amount)).await?;
    if relay_amount == 0 {
        return Err(BridgeError::ZeroRelayAmount {
            token: token.address.clone(),
        }
        .into());
    }
    let rate = lookup(ctx, registry.get_fee_rate(&relay_token, to_chain)).await?;

    let relay_fee = fee_amount(relay_amount, &rate);
    let fee = scale(relay_fee, amount, relay_amount);
    tracing::debug!(
        token = %token,
        relay_token = %relay_token,
        %to_chain,
        amount,
        relay_amount,
        relay_fee,
        fee,
        "bridge fee"
    );

    Ok(BridgeFee {
        fee_token: token.clone(),
        amount: fee,
        fee_rate: FeeRate {
            lowest: scale(rate.lowest, amount, relay_amount),
            highest: scale(rate.highest, amount, relay_amount),
            rate: rate.rate,
        },
    })
}
