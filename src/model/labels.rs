//! The closed label sets offered by the submission forms and by the category/source filters.
//!
//! Both sides read these lists, so the filter choices always match what can be submitted.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Rent",
    "Internet",
    "Phone",
    "Groceries",
    "Transport",
    "Entertainment",
    "Shopping",
    "Health",
    "Education",
    "Utilities",
    "Dining",
    "Other",
];

pub const INCOME_SOURCES: &[&str] = &[
    "Salary",
    "Freelance",
    "Business",
    "Investment",
    "Bonus",
    "Gift",
    "Refund",
    "Other",
];

pub const SAVING_CATEGORIES: &[&str] = &[
    "Emergency Fund",
    "Travel Fund",
    "Home / Rent",
    "Phone Bill",
    "Investment",
    "Shopping Budget",
    "Education",
    "Healthcare",
    "Other",
];

/// Returns the canonical label from `labels` that equals `value`, ignoring ASCII case.
pub fn canonical(labels: &[&'static str], value: &str) -> Option<&'static str> {
    let value = value.trim();
    labels
        .iter()
        .copied()
        .find(|label| label.eq_ignore_ascii_case(value))
}

const REGULAR_STR: &str = "regular";
const ADDITIONAL_STR: &str = "additional";

/// Whether an expense recurs every month or happens once.
///
/// The store does not validate this field, so anything other than the two known values is kept
/// verbatim in `Unknown` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ExpenseType {
    /// Recurring, monthly-budgeted (e.g. rent).
    Regular,
    /// One-time. Records that arrive without a type are additional.
    #[default]
    Additional,
    Unknown(String),
}

impl ExpenseType {
    pub fn as_str(&self) -> &str {
        match self {
            ExpenseType::Regular => REGULAR_STR,
            ExpenseType::Additional => ADDITIONAL_STR,
            ExpenseType::Unknown(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ExpenseType::Unknown(_))
    }

    fn from_label(s: &str) -> Self {
        match s {
            REGULAR_STR => ExpenseType::Regular,
            ADDITIONAL_STR => ExpenseType::Additional,
            "" => ExpenseType::default(),
            other => ExpenseType::Unknown(other.to_string()),
        }
    }
}

impl FromStr for ExpenseType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExpenseType::from_label(s))
    }
}

impl Display for ExpenseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExpenseType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExpenseType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(ExpenseType::from_label(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical() {
        assert_eq!(canonical(EXPENSE_CATEGORIES, "groceries"), Some("Groceries"));
        assert_eq!(canonical(SAVING_CATEGORIES, " home / rent "), Some("Home / Rent"));
        assert_eq!(canonical(INCOME_SOURCES, "Lottery"), None);
    }

    #[test]
    fn test_expense_type_parse() {
        assert_eq!("regular".parse::<ExpenseType>().unwrap(), ExpenseType::Regular);
        assert_eq!(
            "additional".parse::<ExpenseType>().unwrap(),
            ExpenseType::Additional
        );
        assert_eq!("".parse::<ExpenseType>().unwrap(), ExpenseType::Additional);
        assert_eq!(
            "Regular".parse::<ExpenseType>().unwrap(),
            ExpenseType::Unknown("Regular".to_string())
        );
    }

    #[test]
    fn test_expense_type_missing_is_additional() {
        let t: ExpenseType = serde_json::from_str("null").unwrap();
        assert_eq!(t, ExpenseType::Additional);
    }

    #[test]
    fn test_expense_type_unknown_round_trips_text() {
        let t: ExpenseType = serde_json::from_str("\"weekly\"").unwrap();
        assert!(!t.is_known());
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"weekly\"");
    }
}
