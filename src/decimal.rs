use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::{LedgerError, Result};

/// number of fractional digits carried by every amount
pub const MONEY_SCALE: u32 = 2;

/// Money type with two decimal places.
///
/// Every constructor and every arithmetic result is rounded half-to-even
/// (banker's rounding) to [`MONEY_SCALE`] places and rescaled, so two values
/// that compare equal also print and serialize identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

fn normalize(d: Decimal) -> Decimal {
    let mut rounded = d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, MONEY_SCALE));

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(normalize(d))
    }

    /// create from integer amount (reais, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(normalize(Decimal::from(amount)))
    }

    /// create from minor amount (centavos, cents)
    pub fn from_minor(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_SCALE))
    }

    /// Parse user input.
    ///
    /// Accepts either `,` or `.` as the fractional separator and an optional
    /// `R$` prefix. When both separators appear, the last one is the
    /// fractional separator and the other is treated as digit grouping, so
    /// `1.234,56` and `1,234.56` both parse to the same value.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidAmount {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix("R$").unwrap_or(trimmed).trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let last_comma = trimmed.rfind(',');
        let last_dot = trimmed.rfind('.');
        let canonical = match (last_comma, last_dot) {
            (Some(c), Some(d)) if c > d => trimmed.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => trimmed.replace(',', ""),
            (Some(_), None) => trimmed.replace(',', "."),
            _ => trimmed.to_string(),
        };

        if !canonical
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err(invalid());
        }

        Decimal::from_str(&canonical)
            .map(Money::from_decimal)
            .map_err(|_| invalid())
    }

    /// parse and require a strictly positive amount after rounding
    pub fn parse_positive(input: &str) -> Result<Self> {
        let amount = Money::parse(input)?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                input: input.to_string(),
            });
        }
        Ok(amount)
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// negative values become zero
    pub fn clamp_non_negative(self) -> Self {
        self.max(Money::ZERO)
    }

    /// Divide into `parts` equal shares, each rounded on its own.
    ///
    /// The shares are not adjusted to add back up to `self`.
    pub fn split(self, parts: u32) -> Option<Self> {
        if parts == 0 {
            return None;
        }
        Some(Money::from_decimal(self.0 / Decimal::from(parts)))
    }

    /// Brazilian currency format: `R$ 1.234,56`, `-R$ 0,50`.
    pub fn format_brl(&self) -> String {
        let plain = self.abs().0.to_string();
        let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (i, ch) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}R$ {},{}", sign, grouped, fraction)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Money::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<Money> for Decimal {
    fn from(m: Money) -> Self {
        m.0
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(normalize(self.0 + other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = normalize(self.0 + other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(normalize(self.0 - other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = normalize(self.0 - other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_decimal(dec!(100.123456789));
        assert_eq!(m.to_string(), "100.12");

        let whole = Money::from_major(300);
        assert_eq!(whole.to_string(), "300.00");
    }

    #[test]
    fn test_half_even_rounding() {
        assert_eq!(Money::from_decimal(dec!(0.125)), Money::from_minor(12));
        assert_eq!(Money::from_decimal(dec!(0.135)), Money::from_minor(14));
        assert_eq!(Money::from_decimal(dec!(2.5050)), Money::from_minor(250));
    }

    #[test]
    fn test_parse_separators() {
        assert_eq!(Money::parse("10,50").unwrap(), Money::from_minor(1050));
        assert_eq!(Money::parse("10.50").unwrap(), Money::from_minor(1050));
        assert_eq!(Money::parse(" R$ 1.234,56 ").unwrap(), Money::from_minor(123_456));
        assert_eq!(Money::parse("1,234.56").unwrap(), Money::from_minor(123_456));
        assert_eq!(Money::parse("-3").unwrap(), Money::from_major(-3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "   ", "abc", "1,2,3", "12a", "R$", "1e5"] {
            assert!(
                matches!(Money::parse(input), Err(LedgerError::InvalidAmount { .. })),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_positive() {
        assert!(Money::parse_positive("0").is_err());
        assert!(Money::parse_positive("-1,00").is_err());
        // rounds to zero
        assert!(Money::parse_positive("0.004").is_err());
        assert_eq!(Money::parse_positive("0,01").unwrap(), Money::CENT);
    }

    #[test]
    fn test_arithmetic_stays_two_places() {
        let a = Money::from_minor(1999);
        let b = Money::from_minor(1);
        assert_eq!((a + b).to_string(), "20.00");
        assert_eq!((b - a).to_string(), "-19.98");

        let total: Money = [a, b, Money::from_major(5)].iter().sum();
        assert_eq!(total, Money::from_major(25));
    }

    #[test]
    fn test_split() {
        assert_eq!(Money::from_major(300).split(3), Some(Money::from_major(100)));
        assert_eq!(Money::from_major(100).split(3), Some(Money::from_minor(3333)));
        assert_eq!(Money::from_major(100).split(0), None);
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(Money::from_minor(123_456).format_brl(), "R$ 1.234,56");
        assert_eq!(Money::from_minor(50).format_brl(), "R$ 0,50");
        assert_eq!(Money::from_major(1_000_000).format_brl(), "R$ 1.000.000,00");
        assert_eq!(Money::from_minor(-1050).format_brl(), "-R$ 10,50");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_minor(4250)).unwrap();
        assert_eq!(json, "\"42.50\"");

        let back: Money = serde_json::from_str("\"42.5\"").unwrap();
        assert_eq!(back, Money::from_minor(4250));
        assert_eq!(back.to_string(), "42.50");
    }
}
