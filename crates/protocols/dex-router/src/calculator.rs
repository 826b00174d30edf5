//! Constant-product swap math (x * y = k)
//!
//! Fees are in hundredths of a basis point; intermediates use BigInt so that
//! 18- and 24-decimal reserves cannot overflow.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::constants::fees::FEE_DENOM;

/// Output for an exact input.
///
/// Formula: output = (reserves_out * input * (D - fee)) / (reserves_in * D + input * (D - fee))
pub fn calculate_output(
    reserves_in: u128,
    reserves_out: u128,
    input_amount: u128,
    fee_ppm: u32,
) -> u128 {
    if reserves_in == 0 || reserves_out == 0 || input_amount == 0 || fee_ppm >= FEE_DENOM {
        return 0;
    }

    let fee_num = BigInt::from(FEE_DENOM - fee_ppm);
    let input_with_fee = BigInt::from(input_amount) * fee_num;
    let numerator = BigInt::from(reserves_out) * &input_with_fee;
    let denominator = BigInt::from(reserves_in) * BigInt::from(FEE_DENOM) + input_with_fee;

    if denominator.is_zero() {
        return 0;
    }
    (numerator / denominator).to_u128().unwrap_or(0)
}

/// Input required for an exact output, rounded up.
///
/// Formula: input = (reserves_in * output * D) / ((reserves_out - output) * (D - fee)) + 1
pub fn calculate_input(
    reserves_in: u128,
    reserves_out: u128,
    output_amount: u128,
    fee_ppm: u32,
) -> Option<u128> {
    if reserves_in == 0 || reserves_out == 0 || output_amount == 0 || fee_ppm >= FEE_DENOM {
        return None;
    }
    if output_amount >= reserves_out {
        return None;
    }

    let numerator =
        BigInt::from(reserves_in) * BigInt::from(output_amount) * BigInt::from(FEE_DENOM);
    let denominator = (BigInt::from(reserves_out) - BigInt::from(output_amount))
        * BigInt::from(FEE_DENOM - fee_ppm);

    if denominator <= BigInt::zero() {
        return None;
    }
    ((numerator / denominator) + BigInt::from(1)).to_u128()
}
