//! Donation amounts using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing an [`Amount`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("amount is not a number: {0}")]
    NotANumber(String),
    /// The amount is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The amount has more than two decimal places.
    #[error("amount cannot have more than {max} decimal places")]
    TooPrecise {
        /// Maximum allowed decimal places.
        max: u32,
    },
}

/// A positive donation amount in the currency's standard unit.
///
/// Stored normalized and serialized as a decimal string (`"25.5"`), which is
/// how the backend's decimal fields round-trip without float loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Maximum number of decimal places (pesewas).
    pub const MAX_SCALE: u32 = 2;

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not positive or has more than two
    /// decimal places.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }
        let normalized = value.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(AmountError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        Ok(Self(normalized))
    }

    /// Create an amount from whole currency units.
    ///
    /// # Errors
    ///
    /// Returns an error if `units` is zero.
    pub fn from_units(units: u32) -> Result<Self, AmountError> {
        Self::new(Decimal::from(units))
    }

    /// Get the decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity, as the cart does for line totals.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| AmountError::NotANumber(s.to_owned()))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// ISO 4217 currency codes accepted by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Ghanaian cedi, the currency every donation is settled in.
    #[default]
    GHS,
    NGN,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::GHS => "GH₵",
            Self::NGN => "₦",
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        let amount: Amount = "25.5".parse().unwrap();
        assert_eq!(amount.to_string(), "25.50");
        assert_eq!(amount.times(3), Decimal::new(7650, 2));
    }

    #[test]
    fn test_rejects_non_positive_and_precise() {
        assert_eq!("0".parse::<Amount>(), Err(AmountError::NotPositive));
        assert_eq!("-5".parse::<Amount>(), Err(AmountError::NotPositive));
        assert_eq!(
            "1.005".parse::<Amount>(),
            Err(AmountError::TooPrecise { max: 2 })
        );
        assert!(matches!(
            "ten".parse::<Amount>(),
            Err(AmountError::NotANumber(_))
        ));
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_precision() {
        assert!("10.000".parse::<Amount>().is_ok());
    }

    #[test]
    fn test_serializes_as_string() {
        let amount = Amount::from_units(10).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"10\"");
    }

    #[test]
    fn test_currency_symbol() {
        assert_eq!(CurrencyCode::default().symbol(), "GH₵");
    }
}
