//! Amount type for monetary values recorded in the ledger.
//!
//! This module provides the `Amount` type which wraps `Decimal`. The remote store sends amounts as
//! JSON numbers (sometimes as strings), and every recorded amount is non-negative: expenses and
//! incomes carry their direction in their record kind, not in their sign.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// A non-negative monetary value.
///
/// # Examples
///
/// ```
/// # use mm_tracker::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("50.5").unwrap();
/// assert_eq!(amount.to_string(), "50.5");
/// assert!(Amount::from_str("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates an `Amount`, refusing negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    /// Converts a JSON-style float. Non-finite values are refused.
    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        // Going through the shortest display form keeps `0.1` as `0.1` rather than the binary
        // expansion of the float.
        let value = Decimal::from_str(&value.to_string()).map_err(AmountError::Parse)?;
        Self::new(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// An error that can occur when creating an `Amount`.
pub enum AmountError {
    Parse(rust_decimal::Error),
    Negative(Decimal),
    NotFinite,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Parse(e) => write!(f, "Invalid amount: {e}"),
            AmountError::Negative(v) => write!(f, "Amounts cannot be negative, got {v}"),
            AmountError::NotFinite => write!(f, "Amounts must be finite numbers"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(AmountError::Parse)?;
        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The store expects a JSON number.
        match self.0.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number or numeric string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Amount::from_f64(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse() {
        let amount = Amount::from_str(" 50.00 ").unwrap();
        assert_eq!(amount.value(), d("50"));
    }

    #[test]
    fn test_negative_refused() {
        assert!(Amount::from_str("-0.01").is_err());
        assert!(Amount::new(d("-5")).is_err());
    }

    #[test]
    fn test_negative_zero_allowed() {
        let amount = Amount::from_str("-0").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_from_f64_keeps_short_form() {
        let amount = Amount::from_f64(0.1).unwrap();
        assert_eq!(amount.value(), d("0.1"));
        assert!(Amount::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_number() {
        let amount: Amount = serde_json::from_str("19.99").unwrap();
        assert_eq!(amount.value(), d("19.99"));
        let amount: Amount = serde_json::from_str("20").unwrap();
        assert_eq!(amount.value(), d("20"));
    }

    #[test]
    fn test_deserialize_string() {
        let amount: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(amount.value(), d("12.5"));
    }

    #[test]
    fn test_deserialize_negative_fails() {
        let result: Result<Amount, _> = serde_json::from_str("-3");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        let amount = Amount::from_str("12.5").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "12.5");
    }
}
