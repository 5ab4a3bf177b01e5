//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Provides canonical parsing from strings, ledger-precision rounding and
//! formatting without exponent notation.

use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Fractional digits the ledger represents amounts with.
pub const LEDGER_SCALE: u32 = 7;

/// Lossless decimal numeric type for financial calculations.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a canonical JSON string so ledger amounts survive a round trip untouched.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(
    #[serde(
        serialize_with = "serialize_canonical",
        deserialize_with = "rust_decimal::serde::str::deserialize"
    )]
    RustDecimal,
);

fn serialize_canonical<S: Serializer>(value: &RustDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.normalize().to_string())
}

impl Decimal {
    /// The smallest amount the ledger can represent (0.0000001).
    pub const LEDGER_UNIT: Decimal = Decimal(RustDecimal::from_parts(1, 0, 0, false, LEDGER_SCALE));

    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// The multiplicative identity (1).
    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is exactly one, whatever its scale.
    pub fn is_one(&self) -> bool {
        self.0 == RustDecimal::ONE
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Division that yields `None` on a zero divisor or overflow.
    pub fn checked_div(&self, divisor: Decimal) -> Option<Decimal> {
        self.0.checked_div(divisor.0).map(Decimal)
    }

    /// Division that yields zero on a zero divisor.
    ///
    /// Indicator ratios use this so a partially observable fund still reports.
    pub fn safe_div(&self, divisor: Decimal) -> Decimal {
        self.checked_div(divisor).unwrap_or_default()
    }

    /// Percentage of `self` over `whole`, zero when `whole` is zero.
    pub fn percent_of(&self, whole: Decimal) -> Decimal {
        self.safe_div(whole) * Decimal::hundred()
    }

    /// Round to the ledger's native fixed-point precision.
    pub fn round_ledger(&self) -> Decimal {
        Decimal(
            self.0
                .round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }

    /// Clamp negative values to zero.
    pub fn clamp_non_negative(&self) -> Decimal {
        if self.is_negative() {
            Decimal::zero()
        } else {
            *self
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl From<usize> for Decimal {
    fn from(value: usize) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

// Arithmetic operations
impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + *d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_decimal_canonical_strips_trailing_zeros() {
        assert_eq!(dec("1.5000000").to_canonical_string(), "1.5");
        assert_eq!(dec("100").to_canonical_string(), "100");
        assert_eq!(dec("0.0000000").to_canonical_string(), "0");
    }

    #[test]
    fn test_safe_div_zero_divisor_is_zero() {
        assert_eq!(dec("10").safe_div(Decimal::zero()), Decimal::zero());
        assert_eq!(dec("8.5").safe_div(dec("10")), dec("0.85"));
    }

    #[test]
    fn test_round_ledger() {
        assert_eq!(dec("1.23456785").round_ledger(), dec("1.2345679"));
        assert_eq!(dec("2.50000000").round_ledger().to_canonical_string(), "2.5");
        assert_eq!(dec("0.00000004").round_ledger(), Decimal::zero());
    }

    #[test]
    fn test_ledger_unit() {
        assert_eq!(Decimal::LEDGER_UNIT, dec("0.0000001"));
    }

    #[test]
    fn test_is_one_ignores_scale() {
        assert!(dec("1").is_one());
        assert!(dec("1.0000000").is_one());
        assert!(!dec("1.5").is_one());
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(dec("-3").clamp_non_negative(), Decimal::zero());
        assert_eq!(dec("3").clamp_non_negative(), dec("3"));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&dec("12.5000")).unwrap();
        assert_eq!(json, "\"12.5\"");
        let back: Decimal = serde_json::from_str("\"0.0000001\"").unwrap();
        assert_eq!(back, Decimal::LEDGER_UNIT);
    }

    #[test]
    fn test_sum() {
        let total: Decimal = vec![dec("1.5"), dec("2.5")].into_iter().sum();
        assert_eq!(total, dec("4"));
    }
}
