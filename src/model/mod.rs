//! Types that represent the ledger data model, such as `Expense`, `Income` and `SavingPlan`.
mod amount;
mod date;
mod draft;
pub mod labels;
mod record;

pub use amount::{Amount, AmountError};
pub use date::LedgerDate;
pub use draft::{ExpenseDraft, IncomeDraft, NewExpense, NewIncome, NewPlan, PlanDraft};
pub use labels::ExpenseType;
pub(crate) use record::normalize;
pub use record::{
    Activity, ActivityKey, ActivityKind, Expense, Income, PlanSummary, Record, RecordId,
    RecordKind, SavingPlan, Valued,
};
use serde::{Deserialize, Serialize};

/// The session's in-memory copy of everything fetched from the store.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerData {
    pub(crate) expenses: Vec<Expense>,
    pub(crate) incomes: Vec<Income>,
    /// Plans for the period most recently requested.
    pub(crate) plans: Vec<SavingPlan>,
    /// `None` when the summary has not been fetched or its fetch failed.
    pub(crate) plan_summary: Option<PlanSummary>,
    pub(crate) activity: Vec<Activity>,
}

impl LedgerData {
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn incomes(&self) -> &[Income] {
        &self.incomes
    }

    pub fn plans(&self) -> &[SavingPlan] {
        &self.plans
    }

    pub fn plan_summary(&self) -> Option<&PlanSummary> {
        self.plan_summary.as_ref()
    }

    pub fn activity(&self) -> &[Activity] {
        &self.activity
    }
}
