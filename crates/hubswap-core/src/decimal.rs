//! Decimal arithmetic for token amounts
//!
//! [`Decimal`] wraps `BigDecimal`, so operands of different fractional
//! digit counts are aligned and combined exactly. Conversions to integer
//! base units and division always truncate. Nothing here goes through
//! floating point.

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{Result, RouterError};

/// Fractional digits kept by [`div`] on decimal strings.
pub const DEFAULT_DIV_PRECISION: u32 = 36;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal(BigDecimal);

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u32).pow(exp)
}

impl Decimal {
    pub fn zero() -> Self {
        Decimal(BigDecimal::zero())
    }

    pub fn from_integer(value: u128) -> Self {
        Decimal(BigDecimal::new(BigInt::from(value), 0))
    }

    /// Interpret `raw` base units of a token with `decimals` fractional digits.
    pub fn from_base_units(raw: u128, decimals: u8) -> Self {
        Decimal(BigDecimal::new(BigInt::from(raw), decimals as i64))
    }

    /// Parse a plain decimal string such as `"12"`, `"-0.5"` or `"1000.000001"`.
    ///
    /// Exponent notation is rejected; amounts arrive as plain digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        let invalid = || RouterError::validation(format!("invalid decimal '{}'", raw));

        let unsigned = s.strip_prefix(&['-', '+'][..]).unwrap_or(s);
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let sign = if s.starts_with('-') { "-" } else { "" };
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let canonical = if frac_part.is_empty() {
            format!("{}{}", sign, int_part)
        } else {
            format!("{}{}.{}", sign, int_part, frac_part)
        };
        BigDecimal::from_str(&canonical).map(Decimal).map_err(|_| invalid())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }

    /// Fractional digits after dropping trailing zeros.
    pub fn fractional_digits(&self) -> u32 {
        let (_, scale) = self.0.normalized().as_bigint_and_exponent();
        scale.max(0) as u32
    }

    /// Divide, keeping `precision` fractional digits (truncated).
    pub fn div_with_precision(&self, other: &Decimal, precision: u32) -> Result<Decimal> {
        if other.is_zero() {
            return Err(RouterError::validation("division by zero"));
        }
        // Exact integer division over aligned mantissas, so the last kept
        // digit is never rounded.
        let (ma, sa) = self.0.as_bigint_and_exponent();
        let (mb, sb) = other.0.as_bigint_and_exponent();
        let shift = sb - sa + precision as i64;
        let (numerator, denominator) = if shift >= 0 {
            (ma * pow10(shift as u32), mb)
        } else {
            (ma, mb * pow10((-shift) as u32))
        };
        Ok(Decimal(BigDecimal::new(numerator / denominator, precision as i64)))
    }

    /// Drop fractional digits beyond `max_decimals` without rounding up.
    ///
    /// Negative values are floored so the result never exceeds the input.
    pub fn truncate_to_decimals(&self, max_decimals: u32) -> Decimal {
        if self.fractional_digits() <= max_decimals {
            return self.clone();
        }
        Decimal(self.0.with_scale_round(max_decimals as i64, RoundingMode::Floor))
    }

    /// Convert to integer base units of a token, truncating excess digits.
    pub fn to_base_units(&self, decimals: u8) -> Result<u128> {
        if self.is_negative() {
            return Err(RouterError::validation(format!(
                "negative amount {} has no base-unit form",
                self
            )));
        }
        let (units, _) = self
            .0
            .with_scale_round(decimals as i64, RoundingMode::Down)
            .into_bigint_and_exponent();
        units
            .to_u128()
            .ok_or_else(|| RouterError::validation(format!("amount {} overflows u128", self)))
    }
}

impl Add for &Decimal {
    type Output = Decimal;

    fn add(self, rhs: &Decimal) -> Decimal {
        Decimal(&self.0 + &rhs.0)
    }
}

impl Sub for &Decimal {
    type Output = Decimal;

    fn sub(self, rhs: &Decimal) -> Decimal {
        Decimal(&self.0 - &rhs.0)
    }
}

impl Mul for &Decimal {
    type Output = Decimal;

    fn mul(self, rhs: &Decimal) -> Decimal {
        Decimal(&self.0 * &rhs.0)
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

/// Plain notation without trailing zeros, never exponent form.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mantissa, scale) = self.0.normalized().into_bigint_and_exponent();
        let sign = if mantissa.sign() == Sign::Minus { "-" } else { "" };
        let digits = mantissa.magnitude().to_string();
        if scale <= 0 {
            let zeros = if mantissa.is_zero() { 0 } else { (-scale) as usize };
            return write!(f, "{}{}{}", sign, digits, "0".repeat(zeros));
        }
        let scale = scale as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl FromStr for Decimal {
    type Err = RouterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Decimal::parse(s)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(Decimal::from_integer(n as u128)),
            Raw::Str(s) => Decimal::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

// =============================================================================
// Decimal-string operations
// =============================================================================

pub fn add(a: &str, b: &str) -> Result<String> {
    Ok((&Decimal::parse(a)? + &Decimal::parse(b)?).to_string())
}

pub fn sub(a: &str, b: &str) -> Result<String> {
    Ok((&Decimal::parse(a)? - &Decimal::parse(b)?).to_string())
}

pub fn mul(a: &str, b: &str) -> Result<String> {
    Ok((&Decimal::parse(a)? * &Decimal::parse(b)?).to_string())
}

pub fn div(a: &str, b: &str) -> Result<String> {
    Ok(Decimal::parse(a)?
        .div_with_precision(&Decimal::parse(b)?, DEFAULT_DIV_PRECISION)?
        .to_string())
}

/// Truncate (never round) a decimal string to at most `max_decimals` fractional digits.
pub fn truncate_to_decimals(value: &str, max_decimals: u32) -> Result<String> {
    Ok(Decimal::parse(value)?
        .truncate_to_decimals(max_decimals)
        .to_string())
}
