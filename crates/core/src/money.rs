use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A currency amount, always held at two decimal places.
///
/// The currency itself is implied by deployment (baht in the original
/// rollout) and is never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

/// Renders with thousands separators, e.g. `4,800.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = format!("{:.2}", self.0.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        let sign = if self.0.is_sign_negative() && !self.0.is_zero() { "-" } else { "" };
        write!(f, "{sign}{grouped}.{frac_part}")
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rhs: Decimal) -> Self {
        Money::from_decimal(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Money::from_units(4800).to_string(), "4,800.00");
        assert_eq!(Money::from_units(1506).to_string(), "1,506.00");
        assert_eq!(Money::from_units(1_234_567).to_string(), "1,234,567.00");
        assert_eq!(Money::from_units(999).to_string(), "999.00");
    }

    #[test]
    fn display_negative_and_zero() {
        assert_eq!(Money::from_units(-2500).to_string(), "-2,500.00");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn from_decimal_rounds_to_cents() {
        let m = Money::from_decimal(Decimal::from_str("10.005").unwrap());
        assert_eq!(m.amount(), Decimal::from_str("10.00").unwrap());
        let m = Money::from_decimal(Decimal::from_str("10.015").unwrap());
        assert_eq!(m.amount(), Decimal::from_str("10.02").unwrap());
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_units(100);
        let b = Money::from_units(40);
        assert_eq!(a - b, Money::from_units(60));
        assert_eq!(a + b, Money::from_units(140));
        assert_eq!(b * Decimal::from(6), Money::from_units(240));
    }
}
