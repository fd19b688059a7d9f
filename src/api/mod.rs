//! Access to the remote record store.
//!
//! `Store` is the raw transport: it moves JSON values and knows nothing about records. `Client`
//! sits on top of it, decodes and normalizes what comes back, and is what the rest of the crate
//! uses. The in-memory `MemoryStore` lets the whole program run, top to bottom, without a server.

mod http;
mod memory;

use crate::error::{tagged, ErrorType, IntoResult};
use crate::format::Currency;
use crate::model::{
    normalize, Activity, Expense, Income, NewExpense, NewIncome, NewPlan, PlanSummary, RecordId,
    RecordKind, SavingPlan,
};
use crate::{aggregate, Config, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) use http::HttpStore;
pub use memory::{MemoryState, MemoryStore};
#[cfg(test)]
pub(crate) use memory::save_state;

/// The number of recent-activity entries requested when nothing else is configured.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 3;

const TEST_MODE_VAR: &str = "MMT_IN_TEST_MODE";

/// The operations the remote store offers. Every call carries the session token.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// `GET /<kind>/`. `period` narrows the list to one (month, year) where the store supports
    /// it.
    async fn list(
        &self,
        kind: RecordKind,
        token: &str,
        period: Option<(u32, i32)>,
    ) -> Result<Vec<Value>>;

    /// `POST /<kind>/`. Returns the created record.
    async fn create(&self, kind: RecordKind, token: &str, body: Value) -> Result<Value>;

    /// `DELETE /<kind>/<id>`.
    async fn delete(&self, kind: RecordKind, token: &str, id: RecordId) -> Result<()>;

    /// `GET /plans/summary`.
    async fn plan_summary(&self, token: &str, month: u32, year: i32) -> Result<Value>;

    /// `GET /dashboard/recent-activity`.
    async fn recent_activity(&self, token: &str, limit: usize) -> Result<Vec<Value>>;

    /// `GET /settings/`.
    async fn settings(&self, token: &str) -> Result<Value>;
}

/// Which `Store` implementation to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Http,
    Memory,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    /// `Mode::Memory` when `MMT_IN_TEST_MODE` is set to something non-empty, otherwise
    /// `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(value) if !value.is_empty() => Mode::Memory,
            _ => Mode::Http,
        }
    }
}

/// Creates the store for `mode`. In memory mode the store's contents are kept in the home
/// directory so that successive invocations see each other's changes.
pub async fn store(config: &Config, mode: Mode) -> Result<Arc<dyn Store>> {
    debug!("Using the {mode} store");
    Ok(match mode {
        Mode::Http => Arc::new(HttpStore::new(config.api_url().clone())?),
        Mode::Memory => Arc::new(MemoryStore::open(config.memory_store_path()).await?),
    })
}

/// The outcome of deleting a set of records one by one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: Vec<RecordId>,
    pub failed: Vec<RecordId>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Deserialize)]
struct RawSettings {
    #[serde(default)]
    currency: Option<String>,
}

/// Typed access to a `Store`.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn Store>,
}

impl Client {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn expenses(&self, token: &str) -> Result<Vec<Expense>> {
        let values = self
            .store
            .list(RecordKind::Expenses, token, None)
            .await
            .context("Unable to list expenses")?;
        Ok(normalize("expense", values))
    }

    pub async fn incomes(&self, token: &str) -> Result<Vec<Income>> {
        let values = self
            .store
            .list(RecordKind::Incomes, token, None)
            .await
            .context("Unable to list incomes")?;
        Ok(normalize("income", values))
    }

    /// Plans for one (month, year). Plans from other periods are dropped even if the store sends
    /// them.
    pub async fn plans(&self, token: &str, month: u32, year: i32) -> Result<Vec<SavingPlan>> {
        let values = self
            .store
            .list(RecordKind::Plans, token, Some((month, year)))
            .await
            .with_context(|| format!("Unable to list plans for {month}/{year}"))?;
        let plans: Vec<SavingPlan> = normalize("plan", values);
        let total = plans.len();
        let plans: Vec<SavingPlan> = plans
            .into_iter()
            .filter(|p| p.is_for(month, year))
            .collect();
        if plans.len() != total {
            warn!(
                "The store sent {} plans outside of {month}/{year}",
                total - plans.len()
            );
        }
        Ok(plans)
    }

    pub async fn plan_summary(&self, token: &str, month: u32, year: i32) -> Result<PlanSummary> {
        let value = self
            .store
            .plan_summary(token, month, year)
            .await
            .with_context(|| format!("Unable to get the plan summary for {month}/{year}"))?;
        serde_json::from_value(value)
            .context("The plan summary could not be decoded")
            .pub_result(ErrorType::Decode)
    }

    /// The most recent expenses and incomes, newest first.
    pub async fn recent_activity(&self, token: &str, limit: usize) -> Result<Vec<Activity>> {
        let values = self
            .store
            .recent_activity(token, limit)
            .await
            .context("Unable to get the recent activity")?;
        let mut activity: Vec<Activity> = normalize("activity", values);
        aggregate::recent_activity_sort(&mut activity);
        activity.truncate(limit);
        Ok(activity)
    }

    /// The user's display currency. Unknown codes are shown as dollars.
    pub async fn currency(&self, token: &str) -> Result<Currency> {
        let value = self
            .store
            .settings(token)
            .await
            .context("Unable to get the user settings")?;
        let settings: RawSettings = serde_json::from_value(value)
            .context("The user settings could not be decoded")
            .pub_result(ErrorType::Decode)?;
        Ok(Currency::from_code(settings.currency.as_deref()))
    }

    pub async fn create_expense(&self, token: &str, expense: &NewExpense) -> Result<Value> {
        self.create(RecordKind::Expenses, token, expense).await
    }

    pub async fn create_income(&self, token: &str, income: &NewIncome) -> Result<Value> {
        self.create(RecordKind::Incomes, token, income).await
    }

    pub async fn create_plan(&self, token: &str, plan: &NewPlan) -> Result<Value> {
        self.create(RecordKind::Plans, token, plan).await
    }

    async fn create<T: Serialize>(&self, kind: RecordKind, token: &str, body: &T) -> Result<Value> {
        let body = serde_json::to_value(body).map_err(|e| {
            tagged(
                ErrorType::Validation,
                anyhow!("Unable to encode the {kind} payload: {e}"),
            )
        })?;
        self.store
            .create(kind, token, body)
            .await
            .with_context(|| format!("Unable to create a record in {kind}"))
    }

    pub async fn delete(&self, kind: RecordKind, token: &str, id: RecordId) -> Result<()> {
        self.store
            .delete(kind, token, id)
            .await
            .with_context(|| format!("Unable to delete {kind} record {id}"))
    }

    /// Deletes every id in `ids`, one request each. A failure does not stop the remaining
    /// deletes and nothing is rolled back.
    pub async fn delete_many<I>(&self, kind: RecordKind, token: &str, ids: I) -> DeleteReport
    where
        I: IntoIterator<Item = RecordId>,
    {
        let mut report = DeleteReport::default();
        for id in ids {
            match self.delete(kind, token, id).await {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    warn!("{e:#}");
                    report.failed.push(id);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use crate::model::{ExpenseDraft, Record};
    use serde_json::json;

    fn client() -> (MemoryStore, Client) {
        let store = MemoryStore::seeded().unwrap();
        let client = Client::new(Arc::new(store.clone()));
        (store, client)
    }

    #[tokio::test]
    async fn test_list_and_normalize() {
        let (store, client) = client();
        let mut state = store.state();
        state.expenses.push(json!({
            "id": 900, "category": "Rent", "amount": -1, "expense_date": "2026-10-01"
        }));
        store.set_state(state);
        let expenses = client.expenses("t").await.unwrap();
        assert!(!expenses.is_empty());
        assert!(expenses.iter().all(|e| e.id() != RecordId::new(900)));
    }

    #[tokio::test]
    async fn test_plans_only_for_period() {
        let (store, client) = client();
        let mut state = store.state();
        state.plans = vec![
            json!({"id": 1, "category": "Other", "amount": 5, "month": 10, "year": 2026}),
            json!({"id": 2, "category": "Other", "amount": 7, "month": 9, "year": 2026}),
        ];
        store.set_state(state);
        let plans = client.plans("t", 10, 2026).await.unwrap();
        assert_eq!(plans.len(), 1);
        let summary = client.plan_summary("t", 10, 2026).await.unwrap();
        assert_eq!(summary.count(), 1);
        assert_eq!(summary.total_planned().to_string(), "5");
    }

    #[tokio::test]
    async fn test_recent_activity_is_sorted_and_limited() {
        let (_, client) = client();
        let activity = client.recent_activity("t", 3).await.unwrap();
        assert_eq!(activity.len(), 3);
        let dates: Vec<_> = activity.iter().map(|a| a.date().date()).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn test_currency() {
        let (store, client) = client();
        assert_eq!(client.currency("t").await.unwrap(), Currency::Usd);
        let mut state = store.state();
        state.currency = "INR".to_string();
        store.set_state(state);
        assert_eq!(client.currency("t").await.unwrap(), Currency::Inr);
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (_, client) = client();
        let draft = ExpenseDraft {
            category: "Dining".to_string(),
            amount: "12.5".to_string(),
            date: "2026-10-17".to_string(),
            notes: String::new(),
            expense_type: Default::default(),
        };
        let created = client
            .create_expense("t", &draft.validate(Currency::Inr).unwrap())
            .await
            .unwrap();
        let id: RecordId = serde_json::from_value(created["id"].clone()).unwrap();
        let expenses = client.expenses("t").await.unwrap();
        let found = expenses.iter().find(|e| e.id() == id).unwrap();
        assert_eq!(found.category(), "Dining");
    }

    #[tokio::test]
    async fn test_delete_many_keeps_going() {
        let (store, client) = client();
        let ids: Vec<RecordId> = client
            .incomes("t")
            .await
            .unwrap()
            .iter()
            .map(|i| i.id())
            .take(2)
            .collect();
        store.fail_delete(RecordKind::Incomes, ids[0]);
        let report = client.delete_many(RecordKind::Incomes, "t", ids.clone()).await;
        assert_eq!(report.failed, vec![ids[0]]);
        assert_eq!(report.deleted, vec![ids[1]]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_offline_is_network_error() {
        let (store, client) = client();
        store.set_offline(true);
        let e = client.expenses("t").await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Network));
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let (_, client) = client();
        let e = client.incomes("").await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Status));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Memory.to_string(), "memory");
        assert_eq!("http".parse::<Mode>().unwrap(), Mode::Http);
    }
}
