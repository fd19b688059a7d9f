use crate::model::{Amount, ExpenseType, LedgerDate};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::num::ParseIntError;
use std::str::FromStr;
use tracing::warn;

/// The identifier the store assigns to a record. Ids are unique within one `RecordKind`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The three kinds of record the store keeps. The serialized form is also the URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Expenses,
    Incomes,
    Plans,
}

serde_plain::derive_display_from_serialize!(RecordKind);
serde_plain::derive_fromstr_from_deserialize!(RecordKind);

/// Anything that carries an amount.
pub trait Valued {
    fn value(&self) -> Decimal;
}

/// A dated ledger entry that can be filtered by period and by category or source.
pub trait Record: Valued {
    type Key: Clone + Debug + Eq + Ord + Hash;

    /// The identity used for ordering ties and for the activity display order.
    fn key(&self) -> Self::Key;

    fn date(&self) -> &LedgerDate;

    /// The category (expenses, activity) or source (incomes).
    fn label(&self) -> &str;
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    category: String,
    amount: Amount,
    #[serde(rename = "expense_date", default)]
    date: LedgerDate,
    #[serde(rename = "expense_type", default)]
    expense_type: ExpenseType,
    #[serde(default, deserialize_with = "null_as_empty")]
    notes: String,
}

impl Expense {
    pub fn new(
        id: impl Into<RecordId>,
        category: impl Into<String>,
        amount: Amount,
        date: impl Into<LedgerDate>,
        expense_type: ExpenseType,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            amount,
            date: date.into(),
            expense_type,
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn expense_type(&self) -> &ExpenseType {
        &self.expense_type
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

impl Valued for Expense {
    fn value(&self) -> Decimal {
        self.amount.value()
    }
}

impl Record for Expense {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }

    fn date(&self) -> &LedgerDate {
        &self.date
    }

    fn label(&self) -> &str {
        &self.category
    }
}

/// A single income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    source: String,
    amount: Amount,
    #[serde(rename = "income_date", default)]
    date: LedgerDate,
    #[serde(default, deserialize_with = "null_as_empty")]
    notes: String,
}

impl Income {
    pub fn new(
        id: impl Into<RecordId>,
        source: impl Into<String>,
        amount: Amount,
        date: impl Into<LedgerDate>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            amount,
            date: date.into(),
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

impl Valued for Income {
    fn value(&self) -> Decimal {
        self.amount.value()
    }
}

impl Record for Income {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }

    fn date(&self) -> &LedgerDate {
        &self.date
    }

    fn label(&self) -> &str {
        &self.source
    }
}

/// A planned savings allocation for one (month, year). Plans have no date, so they are selected
/// by period with `SavingPlan::is_for` rather than through the `Record` filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingPlan {
    id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    category: String,
    amount: Amount,
    month: u32,
    year: i32,
}

impl SavingPlan {
    pub fn new(
        id: impl Into<RecordId>,
        category: impl Into<String>,
        amount: Amount,
        month: u32,
        year: i32,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            amount,
            month,
            year,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_for(&self, month: u32, year: i32) -> bool {
        self.month == month && self.year == year
    }
}

impl Valued for SavingPlan {
    fn value(&self) -> Decimal {
        self.amount.value()
    }
}

/// The store-computed total of the plans in one (month, year).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    #[serde(default)]
    total_planned: Amount,
    #[serde(default)]
    count: u64,
}

impl PlanSummary {
    pub fn new(total_planned: Amount, count: u64) -> Self {
        Self {
            total_planned,
            count,
        }
    }

    pub fn total_planned(&self) -> Amount {
        self.total_planned
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Whether an activity entry is money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Expense,
    Income,
}

serde_plain::derive_display_from_serialize!(ActivityKind);
serde_plain::derive_fromstr_from_deserialize!(ActivityKind);

/// Expense and income ids come from separate sequences, so an activity entry is identified by
/// both. Ordering compares the id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    pub id: RecordId,
    pub kind: ActivityKind,
}

impl Display for ActivityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// One entry of the mixed recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawActivity")]
pub struct Activity {
    id: RecordId,
    kind: ActivityKind,
    label: String,
    amount: Amount,
    date: LedgerDate,
    notes: String,
}

/// The store has sent the label under `title`, `category` or `source` depending on its version.
#[derive(Deserialize)]
struct RawActivity {
    id: RecordId,
    #[serde(rename = "type")]
    kind: ActivityKind,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    source: Option<String>,
    amount: Amount,
    #[serde(default)]
    date: LedgerDate,
    #[serde(default, deserialize_with = "null_as_empty")]
    notes: String,
}

impl From<RawActivity> for Activity {
    fn from(raw: RawActivity) -> Self {
        let label = [raw.title, raw.category, raw.source]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        Self {
            id: raw.id,
            kind: raw.kind,
            label,
            amount: raw.amount,
            date: raw.date,
            notes: raw.notes,
        }
    }
}

impl Activity {
    pub fn new(
        id: impl Into<RecordId>,
        kind: ActivityKind,
        label: impl Into<String>,
        amount: Amount,
        date: impl Into<LedgerDate>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            amount,
            date: date.into(),
            notes: String::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

impl From<&Expense> for Activity {
    fn from(e: &Expense) -> Self {
        Self {
            id: e.id,
            kind: ActivityKind::Expense,
            label: e.category.clone(),
            amount: e.amount,
            date: e.date.clone(),
            notes: e.notes.clone(),
        }
    }
}

impl From<&Income> for Activity {
    fn from(i: &Income) -> Self {
        Self {
            id: i.id,
            kind: ActivityKind::Income,
            label: i.source.clone(),
            amount: i.amount,
            date: i.date.clone(),
            notes: i.notes.clone(),
        }
    }
}

impl Valued for Activity {
    fn value(&self) -> Decimal {
        self.amount.value()
    }
}

impl Record for Activity {
    type Key = ActivityKey;

    fn key(&self) -> ActivityKey {
        ActivityKey {
            id: self.id,
            kind: self.kind,
        }
    }

    fn date(&self) -> &LedgerDate {
        &self.date
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Decodes each element of a raw list on its own. Elements that do not decode (for example a
/// negative or missing amount) are dropped with a warning instead of failing the whole list.
pub(crate) fn normalize<T>(kind: &str, values: Vec<serde_json::Value>) -> Vec<T>
where
    T: DeserializeOwned,
{
    let mut records = Vec::with_capacity(values.len());
    for (ix, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Dropping {kind} record at index {ix}: {e}"),
        }
    }
    records
}
