//! Amount distribution into percentage buckets

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use hubswap_core::{Result, RouterError};

/// One slice of the trade: `percent` of the total, as a literal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBucket {
    pub percent: u32,
    pub amount: u128,
}

/// Split `total` into buckets at `step`, `2*step`, ..., `100` percent.
///
/// Amounts are `floor(total * percent / 100)` computed exactly.
pub fn distribute(total: u128, step: u32) -> Result<Vec<AmountBucket>> {
    if step == 0 || step > 100 || 100 % step != 0 {
        return Err(RouterError::validation(format!(
            "distribution percent {} must divide 100",
            step
        )));
    }

    (1..=100 / step)
        .map(|i| {
            let percent = i * step;
            let amount = (BigInt::from(total) * BigInt::from(percent)) / BigInt::from(100u32);
            let amount = amount
                .to_u128()
                .ok_or_else(|| RouterError::validation("bucket amount overflows"))?;
            Ok(AmountBucket { percent, amount })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribute_five_percent() {
        let buckets = distribute(1_000, 5).unwrap();
        assert_eq!(buckets.len(), 20);
        assert_eq!(
            buckets[0],
            AmountBucket {
                percent: 5,
                amount: 50
            }
        );
        assert_eq!(
            buckets[19],
            AmountBucket {
                percent: 100,
                amount: 1_000
            }
        );
    }

    #[test]
    fn test_distribute_floors_exactly() {
        let buckets = distribute(333, 25).unwrap();
        let amounts: Vec<u128> = buckets.iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![83, 166, 249, 333]);
    }

    #[test]
    fn test_distribute_near_max() {
        let buckets = distribute(u128::MAX, 50).unwrap();
        assert_eq!(buckets[1].amount, u128::MAX);
        assert_eq!(buckets[0].amount, u128::MAX / 2);
    }

    #[test]
    fn test_distribute_rejects_bad_step() {
        assert!(distribute(100, 0).is_err());
        assert!(distribute(100, 7).is_err());
    }
}
