//! Form input for new records, and the validation that runs before anything is sent.
//!
//! A draft holds what the user typed. `validate` either produces the exact payload the store
//! expects or fails with `ErrorType::Validation`; an invalid draft never reaches the network.

use crate::error::{tagged, ErrorType};
use crate::format::Currency;
use crate::model::labels::{canonical, EXPENSE_CATEGORIES, INCOME_SOURCES, SAVING_CATEGORIES};
use crate::model::{Amount, ExpenseType, LedgerDate};
use crate::Result;
use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(tagged(
            ErrorType::Validation,
            anyhow!("'{field}' is required"),
        ));
    }
    Ok(value)
}

fn label(field: &str, labels: &[&'static str], value: &str) -> Result<&'static str> {
    let value = required(field, value)?;
    canonical(labels, value).ok_or_else(|| {
        tagged(
            ErrorType::Validation,
            anyhow!("'{value}' is not a valid {field}, expected one of: {}", labels.join(", ")),
        )
    })
}

fn amount(value: &str) -> Result<Amount> {
    let value = required("amount", value)?;
    Amount::from_str(value).map_err(|e| tagged(ErrorType::Validation, anyhow!("{e}")))
}

fn date(value: &str) -> Result<NaiveDate> {
    let value = required("date", value)?;
    LedgerDate::parse(value).date().ok_or_else(|| {
        tagged(
            ErrorType::Validation,
            anyhow!("'{value}' is not a date, expected YYYY-MM-DD"),
        )
    })
}

/// What the expense form holds before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub category: String,
    pub amount: String,
    pub date: String,
    pub notes: String,
    pub expense_type: ExpenseType,
}

/// The body of `POST /expenses/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpense {
    category: String,
    amount: Amount,
    expense_date: NaiveDate,
    notes: String,
    expense_type: ExpenseType,
    currency: Currency,
}

impl ExpenseDraft {
    /// The currency code travels with the expense; it is informational only and the amount is
    /// never converted.
    pub fn validate(&self, currency: Currency) -> Result<NewExpense> {
        let category = label("category", EXPENSE_CATEGORIES, &self.category)?;
        let amount = amount(&self.amount)?;
        let expense_date = date(&self.date)?;
        if !self.expense_type.is_known() {
            return Err(tagged(
                ErrorType::Validation,
                anyhow!("'{}' is not an expense type", self.expense_type),
            ));
        }
        Ok(NewExpense {
            category: category.to_string(),
            amount,
            expense_date,
            notes: self.notes.trim().to_string(),
            expense_type: self.expense_type.clone(),
            currency,
        })
    }
}

/// What the income form holds before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeDraft {
    pub source: String,
    pub amount: String,
    pub date: String,
    pub notes: String,
}

/// The body of `POST /incomes/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIncome {
    source: String,
    amount: Amount,
    income_date: NaiveDate,
    notes: String,
}

impl IncomeDraft {
    pub fn validate(&self) -> Result<NewIncome> {
        Ok(NewIncome {
            source: label("source", INCOME_SOURCES, &self.source)?.to_string(),
            amount: amount(&self.amount)?,
            income_date: date(&self.date)?,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// What the saving-plan form holds. The plan's period is not typed by the user, it is the
/// period currently selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDraft {
    pub category: String,
    pub amount: String,
}

/// The body of `POST /plans/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlan {
    category: String,
    amount: Amount,
    month: u32,
    year: i32,
}

impl PlanDraft {
    pub fn validate(&self, month: u32, year: i32) -> Result<NewPlan> {
        let category = label("category", SAVING_CATEGORIES, &self.category)?;
        let amount = amount(&self.amount)?;
        if !(1..=12).contains(&month) {
            return Err(tagged(
                ErrorType::Validation,
                anyhow!("Month must be between 1 and 12, got {month}"),
            ));
        }
        Ok(NewPlan {
            category: category.to_string(),
            amount,
            month,
            year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use serde_json::json;

    fn expense_draft() -> ExpenseDraft {
        ExpenseDraft {
            category: "groceries".to_string(),
            amount: "42.10".to_string(),
            date: "2026-01-05".to_string(),
            notes: " weekly shop ".to_string(),
            expense_type: ExpenseType::Regular,
        }
    }

    #[test]
    fn test_expense_payload() {
        let payload = expense_draft().validate(Currency::Inr).unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body,
            json!({
                "category": "Groceries",
                "amount": 42.1,
                "expense_date": "2026-01-05",
                "notes": "weekly shop",
                "expense_type": "regular",
                "currency": "INR"
            })
        );
    }

    #[test]
    fn test_expense_missing_fields() {
        for blank in ["category", "amount", "date"] {
            let mut draft = expense_draft();
            match blank {
                "category" => draft.category = "  ".to_string(),
                "amount" => draft.amount = String::new(),
                _ => draft.date = String::new(),
            }
            let e = draft.validate(Currency::Usd).unwrap_err();
            assert_eq!(error_type(&e), Some(ErrorType::Validation));
            assert!(e.to_string().contains(blank), "{e}");
        }
    }

    #[test]
    fn test_expense_unknown_category() {
        let mut draft = expense_draft();
        draft.category = "Yachts".to_string();
        let e = draft.validate(Currency::Usd).unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
    }

    #[test]
    fn test_expense_negative_amount() {
        let mut draft = expense_draft();
        draft.amount = "-4".to_string();
        assert!(draft.validate(Currency::Usd).is_err());
    }

    #[test]
    fn test_expense_zero_amount_is_allowed() {
        let mut draft = expense_draft();
        draft.amount = "0".to_string();
        assert!(draft.validate(Currency::Usd).is_ok());
    }

    #[test]
    fn test_income_bad_date() {
        let draft = IncomeDraft {
            source: "Salary".to_string(),
            amount: "1000".to_string(),
            date: "03/01/2026".to_string(),
            notes: String::new(),
        };
        let e = draft.validate().unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
    }

    #[test]
    fn test_plan_payload() {
        let draft = PlanDraft {
            category: "Travel Fund".to_string(),
            amount: "150".to_string(),
        };
        let body = serde_json::to_value(draft.validate(3, 2026).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"category": "Travel Fund", "amount": 150.0, "month": 3, "year": 2026})
        );
        assert!(draft.validate(13, 2026).is_err());
    }
}
