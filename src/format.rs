//! Presentation of amounts and dates.
//!
//! Switching the currency only swaps the symbol in front of the number. Amounts are never
//! converted between currencies.

use crate::model::LedgerDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// The display currency of the session.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Inr,
}

serde_plain::derive_display_from_serialize!(Currency);
serde_plain::derive_fromstr_from_deserialize!(Currency);

impl Currency {
    /// Reads a stored currency code. Anything other than exactly `INR`, including a missing
    /// code, is shown as dollars.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("INR") => Currency::Inr,
            _ => Currency::Usd,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
        }
    }
}

/// Formats `amount` with two decimal places and no symbol. A missing amount is `0.00`.
pub fn format_amount(amount: Option<Decimal>) -> String {
    let value = amount
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{value:.2}")
}

/// Formats `amount` as, e.g., `$12.50` or `₹12.50`. A missing amount is shown as zero.
pub fn format_money(amount: Option<Decimal>, currency: Currency) -> String {
    format!("{}{}", currency.symbol(), format_amount(amount))
}

/// Like `format_money` for amounts that arrive as floats. `NaN` and infinities are treated as a
/// missing amount.
pub fn format_money_f64(amount: Option<f64>, currency: Currency) -> String {
    let value = amount
        .filter(|f| f.is_finite())
        .and_then(Decimal::from_f64);
    format_money(value, currency)
}

/// Formats a record date as `Jan 05, 2026`. Dates that could not be parsed are shown as they were
/// received.
pub fn format_date(date: &LedgerDate) -> String {
    match date.date() {
        Some(d) => d.format("%b %d, %Y").to_string(),
        None => date.raw().to_string(),
    }
}

/// How a signed figure such as remaining savings should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
}

impl Tone {
    pub fn of(value: Decimal) -> Self {
        if value.is_sign_negative() && !value.is_zero() {
            Tone::Negative
        } else {
            Tone::Positive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Option<Decimal> {
        Some(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_zero_inr() {
        assert_eq!(format_money(Some(Decimal::ZERO), Currency::Inr), "₹0.00");
    }

    #[test]
    fn test_missing_usd() {
        assert_eq!(format_money(None, Currency::Usd), "$0.00");
    }

    #[test]
    fn test_nan_and_infinity() {
        assert_eq!(format_money_f64(Some(f64::NAN), Currency::Usd), "$0.00");
        assert_eq!(format_money_f64(Some(f64::INFINITY), Currency::Inr), "₹0.00");
        assert_eq!(format_money_f64(None, Currency::Inr), "₹0.00");
        assert_eq!(format_money_f64(Some(3.5), Currency::Usd), "$3.50");
    }

    #[test]
    fn test_two_decimal_places() {
        assert_eq!(format_money(d("1234.5"), Currency::Usd), "$1234.50");
        assert_eq!(format_money(d("7"), Currency::Usd), "$7.00");
        assert_eq!(format_money(d("0.005"), Currency::Usd), "$0.01");
        assert_eq!(format_money(d("2.344"), Currency::Usd), "$2.34");
    }

    #[test]
    fn test_negative_keeps_sign_after_symbol() {
        assert_eq!(format_money(d("-12.5"), Currency::Usd), "$-12.50");
    }

    #[test]
    fn test_currency_does_not_convert() {
        let amount = d("100");
        assert_eq!(format_money(amount, Currency::Usd), "$100.00");
        assert_eq!(format_money(amount, Currency::Inr), "₹100.00");
    }

    #[test]
    fn test_unsymbolled() {
        assert_eq!(format_amount(d("9.9")), "9.90");
        assert_eq!(format_amount(None), "0.00");
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Currency::from_code(Some("INR")), Currency::Inr);
        assert_eq!(Currency::from_code(Some("inr")), Currency::Usd);
        assert_eq!(Currency::from_code(Some(" INR")), Currency::Usd);
        assert_eq!(Currency::from_code(Some("EUR")), Currency::Usd);
        assert_eq!(Currency::from_code(None), Currency::Usd);
        assert_eq!(Currency::Inr.to_string(), "INR");
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&LedgerDate::parse("2026-01-05")), "Jan 05, 2026");
        assert_eq!(format_date(&LedgerDate::parse("not a date")), "not a date");
    }

    #[test]
    fn test_tone() {
        assert_eq!(Tone::of(Decimal::from(-1)), Tone::Negative);
        assert_eq!(Tone::of(Decimal::ZERO), Tone::Positive);
        assert_eq!(Tone::of(Decimal::from(5)), Tone::Positive);
    }
}
