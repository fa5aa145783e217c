use std::fmt;

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Zatoshi per whole coin (`zenutil.ZentoshiPerZen` in the original source).
pub const ZATOSHI_PER_COIN: i64 = 100_000_000;

#[derive(Error, Debug)]
pub enum AmountError {
    #[error("amount {0} does not fit in a signed 64-bit zatoshi count")]
    Overflow(Decimal),
}

/// A signed quantity of zatoshi (the chain's native value scaled by 1e8).
///
/// Rosetta operations carry amounts as decimal strings; this type is the
/// single point where the node's arbitrary-precision JSON decimals are
/// converted to the fixed-point integers every other component works with.
/// Conversion never goes through a floating-point intermediate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(pub i64);

impl Amount {
    pub fn zatoshi(value: i64) -> Amount {
        Amount(value)
    }

    /// Converts a node-reported coin amount (e.g. `7.36`) to zatoshi.
    ///
    /// Uses round-half-to-even ("banker's rounding") at the 8th decimal
    /// place, matching the precision the node itself is constrained to.
    pub fn from_coin_decimal(value: Decimal) -> Result<Amount, AmountError> {
        let scaled = (value * Decimal::from(ZATOSHI_PER_COIN))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        scaled
            .to_i64()
            .map(Amount)
            .ok_or(AmountError::Overflow(value))
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_neg(self) -> Option<Amount> {
        self.0.checked_neg().map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount(0), |acc, a| acc + a)
    }
}
