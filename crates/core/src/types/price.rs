//! Lenient price parsing over decimal arithmetic.
//!
//! The backend returns every amount pre-formatted for display ("0.500 KD",
//! "KD 1.250", "12,000.750 KD") and never a bare number. Derived sums are
//! advisory only - the server owns the authoritative totals - so parsing is
//! lenient: strip everything that is not a digit or decimal point, then read
//! the remainder as a [`Decimal`]. Unparseable input yields zero rather than
//! an error.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount parsed from a display-formatted price string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from an already-parsed decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a display-formatted price string, tolerating currency symbols,
    /// codes, and thousands separators.
    ///
    /// Only digits and the first decimal point survive; any later decimal
    /// points are dropped along with the rest of the noise. Input with no
    /// digits at all parses as zero.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut cleaned = String::with_capacity(raw.len());
        let mut seen_point = false;

        for c in raw.chars() {
            if c.is_ascii_digit() {
                cleaned.push(c);
            } else if c == '.' && !seen_point {
                seen_point = true;
                cleaned.push(c);
            }
        }

        Decimal::from_str(&cleaned).map_or(Self::ZERO, Self)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_currency_suffix() {
        assert_eq!(Price::parse("0.500 KD").amount(), dec("0.500"));
        assert_eq!(Price::parse("1.250 KD").amount(), dec("1.250"));
    }

    #[test]
    fn test_parse_currency_prefix_and_separators() {
        assert_eq!(Price::parse("KD 12,000.750").amount(), dec("12000.750"));
        assert_eq!(Price::parse("$19.99").amount(), dec("19.99"));
    }

    #[test]
    fn test_parse_no_digits_is_zero() {
        assert_eq!(Price::parse("free"), Price::ZERO);
        assert_eq!(Price::parse(""), Price::ZERO);
    }

    #[test]
    fn test_parse_keeps_first_decimal_point_only() {
        // Pathological input still parses deterministically.
        assert_eq!(Price::parse("1.2.3").amount(), dec("1.23"));
    }

    #[test]
    fn test_times() {
        let unit = Price::parse("0.500 KD");
        assert_eq!(unit.times(2), dec("1.000"));
    }
}
