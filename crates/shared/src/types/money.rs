//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in whole currency units.
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "COP", "CLP").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Colombian Peso
    Cop,
    /// Chilean Peso
    Clp,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative()
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Cop
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cop => write!(f, "COP"),
            Self::Clp => write!(f, "CLP"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COP" => Ok(Self::Cop),
            "CLP" => Ok(Self::Clp),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_new() {
        let amount = dec!(30000);
        let money = Money::new(amount, Currency::Cop);
        assert_eq!(money.amount, amount);
        assert_eq!(money.currency, Currency::Cop);
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Clp);
        assert!(money.is_zero());
        assert_eq!(money.amount, Decimal::ZERO);
        assert_eq!(money.currency, Currency::Clp);
    }

    #[test]
    fn test_money_is_negative() {
        let positive = Money::new(dec!(10), Currency::Cop);
        assert!(!positive.is_negative());

        let negative = Money::new(dec!(-10), Currency::Cop);
        assert!(negative.is_negative());

        let zero = Money::new(dec!(0), Currency::Cop);
        assert!(!zero.is_negative());
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Cop.to_string(), "COP");
        assert_eq!(Currency::Clp.to_string(), "CLP");
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Eur.to_string(), "EUR");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("COP").unwrap(), Currency::Cop);
        assert_eq!(Currency::from_str("cop").unwrap(), Currency::Cop);
        assert_eq!(Currency::from_str("CLP").unwrap(), Currency::Clp);
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("EUR").unwrap(), Currency::Eur);

        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }
}
