//! Implements the `Store` trait in memory.
//!
//! This is compiled into the binary, not only the tests, so the whole program can run without a
//! server (see `Mode::Memory`). It behaves like the real store where the client can observe it:
//! ids are assigned on create, an empty token is refused, a missing id cannot be deleted, plans
//! can be listed per (month, year) and the recent activity mixes expenses and incomes.

use crate::api::Store;
use crate::error::{tagged, ErrorType};
use crate::model::{Amount, RecordId, RecordKind};
use crate::{utils, Result};
use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Everything a `MemoryStore` holds. The fields after `next_id` only steer failures and record
/// calls for tests; they are not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub expenses: Vec<Value>,
    pub incomes: Vec<Value>,
    pub plans: Vec<Value>,
    pub currency: String,
    pub next_id: u64,
    /// Deleting any of these fails with a status error and leaves the record in place.
    #[serde(skip)]
    pub failing_deletes: BTreeSet<(RecordKind, RecordId)>,
    /// Every call fails with a network error.
    #[serde(skip)]
    pub offline: bool,
    /// How many times each kind has been listed.
    #[serde(skip)]
    pub list_calls: BTreeMap<RecordKind, usize>,
}

impl MemoryState {
    fn records(&self, kind: RecordKind) -> &Vec<Value> {
        match kind {
            RecordKind::Expenses => &self.expenses,
            RecordKind::Incomes => &self.incomes,
            RecordKind::Plans => &self.plans,
        }
    }

    fn records_mut(&mut self, kind: RecordKind) -> &mut Vec<Value> {
        match kind {
            RecordKind::Expenses => &mut self.expenses,
            RecordKind::Incomes => &mut self.incomes,
            RecordKind::Plans => &mut self.plans,
        }
    }
}

/// An implementation of `Store` that holds its records in memory. Clones share the same state,
/// so a test can keep a clone to inspect or rearrange what the client sees.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    /// When set, the state is written here after every change.
    persist_to: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(state: MemoryState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            persist_to: None,
        }
    }

    /// A store holding the seed data from this module.
    pub fn seeded() -> Result<Self> {
        Ok(Self::new(seed_state()?))
    }

    /// Loads the state saved at `path`, or starts from the seed data if there is none yet.
    /// Changes are saved back to `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match utils::read_optional(&path).await? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("Unable to parse the store at {}", path.display()))?,
            None => seed_state()?,
        };
        let store = Self {
            state: Arc::new(Mutex::new(state)),
            persist_to: Some(path),
        };
        store.persist().await?;
        Ok(store)
    }

    /// A copy of the current state.
    pub fn state(&self) -> MemoryState {
        self.lock().clone()
    }

    pub fn set_state(&self, state: MemoryState) {
        *self.lock() = state;
    }

    /// Makes every later delete of `id` in `kind` fail.
    pub fn fail_delete(&self, kind: RecordKind, id: RecordId) {
        self.lock().failing_deletes.insert((kind, id));
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// How many times `kind` has been listed.
    pub fn list_calls(&self, kind: RecordKind) -> usize {
        self.lock().list_calls.get(&kind).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the state after checking the conditions every call shares.
    fn enter(&self, token: &str) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.lock();
        if state.offline {
            return Err(tagged(
                ErrorType::Network,
                anyhow!("The in-memory store is offline"),
            ));
        }
        if token.is_empty() {
            return Err(tagged(ErrorType::Status, anyhow!("401: Not authenticated")));
        }
        Ok(state)
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.persist_to else {
            return Ok(());
        };
        let state = self.state();
        save_state(path, &state).await
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn list(
        &self,
        kind: RecordKind,
        token: &str,
        period: Option<(u32, i32)>,
    ) -> Result<Vec<Value>> {
        trace!("list {kind}");
        let mut state = self.enter(token)?;
        *state.list_calls.entry(kind).or_default() += 1;
        let records = state.records(kind);
        Ok(match (kind, period) {
            (RecordKind::Plans, Some((month, year))) => records
                .iter()
                .filter(|p| {
                    p.get("month").and_then(Value::as_u64) == Some(u64::from(month))
                        && p.get("year").and_then(Value::as_i64) == Some(i64::from(year))
                })
                .cloned()
                .collect(),
            _ => records.clone(),
        })
    }

    async fn create(&self, kind: RecordKind, token: &str, body: Value) -> Result<Value> {
        trace!("create {kind}");
        let created = {
            let mut state = self.enter(token)?;
            let Value::Object(mut record) = body else {
                return Err(tagged(
                    ErrorType::Status,
                    anyhow!("422: The {kind} payload must be an object"),
                ));
            };
            let id = state.next_id;
            state.next_id += 1;
            record.insert("id".to_string(), json!(id));
            let record = Value::Object(record);
            state.records_mut(kind).push(record.clone());
            record
        };
        self.persist().await?;
        Ok(created)
    }

    async fn delete(&self, kind: RecordKind, token: &str, id: RecordId) -> Result<()> {
        trace!("delete {kind} {id}");
        {
            let mut state = self.enter(token)?;
            if state.failing_deletes.contains(&(kind, id)) {
                return Err(tagged(
                    ErrorType::Status,
                    anyhow!("500: Unable to delete {kind} {id}"),
                ));
            }
            let records = state.records_mut(kind);
            let before = records.len();
            records.retain(|r| r.get("id").and_then(Value::as_u64) != Some(id.get()));
            if records.len() == before {
                return Err(tagged(ErrorType::Status, anyhow!("404: {kind} {id} not found")));
            }
        }
        self.persist().await
    }

    async fn plan_summary(&self, token: &str, month: u32, year: i32) -> Result<Value> {
        let plans = self.list(RecordKind::Plans, token, Some((month, year))).await?;
        let mut total = Decimal::ZERO;
        for plan in &plans {
            let amount: Amount = serde_json::from_value(plan["amount"].clone())
                .context("A stored plan has an invalid amount")?;
            total += amount.value();
        }
        let total_planned = Amount::new(total).map_err(|e| anyhow!("{e}"))?;
        Ok(json!({
            "month": month,
            "year": year,
            "total_planned": total_planned,
            "count": plans.len(),
        }))
    }

    async fn recent_activity(&self, token: &str, limit: usize) -> Result<Vec<Value>> {
        let state = self.enter(token)?;
        let expenses = state
            .expenses
            .iter()
            .map(|e| activity(e, "expense", "category", "expense_date"));
        let incomes = state
            .incomes
            .iter()
            .map(|i| activity(i, "income", "source", "income_date"));
        let mut all: Vec<Value> = expenses.chain(incomes).collect();
        all.sort_by(|a, b| date_of(b).cmp(date_of(a)));
        all.truncate(limit);
        Ok(all)
    }

    async fn settings(&self, token: &str) -> Result<Value> {
        let state = self.enter(token)?;
        Ok(json!({ "currency": state.currency, "usd_to_inr_rate": 81.0 }))
    }
}

fn activity(record: &Value, kind: &str, label: &str, date: &str) -> Value {
    let field = |name: &str| record.get(name).cloned().unwrap_or(Value::Null);
    json!({
        "id": field("id"),
        "type": kind,
        "title": field(label),
        "amount": field("amount"),
        "date": field(date),
        "notes": field("notes"),
    })
}

fn date_of(activity: &Value) -> &str {
    activity.get("date").and_then(Value::as_str).unwrap_or("")
}

fn seed_state() -> Result<MemoryState> {
    let expenses = load_csv(EXPENSE_DATA).context("Bad expense seed data")?;
    let incomes = load_csv(INCOME_DATA).context("Bad income seed data")?;
    let plans = load_csv(PLAN_DATA).context("Bad plan seed data")?;
    let next_id = expenses
        .iter()
        .chain(&incomes)
        .chain(&plans)
        .filter_map(|r| r.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0)
        + 1;
    Ok(MemoryState {
        expenses,
        incomes,
        plans,
        currency: "USD".to_string(),
        next_id,
        ..MemoryState::default()
    })
}

/// Loads records from CSV with a header row. `id`, `month`, `year` and `amount` become JSON
/// numbers; an empty cell becomes `null`; everything else is a string.
fn load_csv(csv_data: &str) -> Result<Vec<Value>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let mut record = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let value = match header {
                _ if cell.is_empty() => Value::Null,
                "id" | "month" => json!(cell.parse::<u64>()?),
                "year" => json!(cell.parse::<i64>()?),
                "amount" => json!(cell.parse::<f64>()?),
                _ => json!(cell),
            };
            record.insert(header.to_string(), value);
        }
        records.push(Value::Object(record));
    }
    Ok(records)
}

/// Writes `state` to `path` the way `MemoryStore::open` expects it.
pub(crate) async fn save_state(path: &Path, state: &MemoryState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Unable to serialize the store")?;
    utils::write(path, json).await
}

/// Seed expense data.
const EXPENSE_DATA: &str = r##"id,category,amount,expense_date,expense_type,notes
1,Rent,1200.00,2026-10-01,regular,October rent
2,Internet,49.99,2026-10-02,regular,
3,Groceries,87.43,2026-10-05,additional,Weekly shop
4,Dining,23.10,2026-10-09,additional,
5,Transport,35.00,2026-10-12,regular,Monthly pass
6,Groceries,63.21,2026-10-15,additional,
7,Rent,1200.00,2026-09-01,regular,September rent
8,Shopping,129.95,2026-09-18,additional,Shoes
"##;

/// Seed income data.
const INCOME_DATA: &str = r##"id,source,amount,income_date,notes
101,Salary,4200.00,2026-10-01,
102,Freelance,650.00,2026-10-14,Logo design
103,Salary,4200.00,2026-09-01,
"##;

/// Seed saving plan data.
const PLAN_DATA: &str = r##"id,category,amount,month,year
201,Emergency Fund,500.00,10,2026
202,Travel Fund,250.00,10,2026
203,Emergency Fund,500.00,9,2026
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_seed() {
        let state = seed_state().unwrap();
        assert_eq!(state.expenses.len(), 8);
        assert_eq!(state.incomes.len(), 3);
        assert_eq!(state.plans.len(), 3);
        assert_eq!(state.next_id, 204);
        assert_eq!(state.expenses[1]["notes"], Value::Null);
        assert_eq!(state.expenses[0]["amount"], json!(1200.0));
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let store = MemoryStore::seeded().unwrap();
        let a = store
            .create(RecordKind::Plans, "t", json!({"category": "Other"}))
            .await
            .unwrap();
        let b = store
            .create(RecordKind::Plans, "t", json!({"category": "Other"}))
            .await
            .unwrap();
        assert_eq!(a["id"], json!(204));
        assert_eq!(b["id"], json!(205));
    }

    #[tokio::test]
    async fn test_delete_missing_is_status_error() {
        let store = MemoryStore::seeded().unwrap();
        let e = store
            .delete(RecordKind::Expenses, "t", RecordId::new(999))
            .await
            .unwrap_err();
        assert_eq!(crate::error::error_type(&e), Some(ErrorType::Status));
    }

    #[tokio::test]
    async fn test_recent_activity_mixes_kinds() {
        let store = MemoryStore::seeded().unwrap();
        let activity = store.recent_activity("t", 3).await.unwrap();
        assert_eq!(activity.len(), 3);
        assert_eq!(activity[0]["type"], json!("expense"));
        assert_eq!(activity[0]["date"], json!("2026-10-15"));
        assert_eq!(activity[1]["type"], json!("income"));
    }

    #[tokio::test]
    async fn test_list_calls_counted() {
        let store = MemoryStore::seeded().unwrap();
        store.list(RecordKind::Expenses, "t", None).await.unwrap();
        store.list(RecordKind::Expenses, "t", None).await.unwrap();
        assert_eq!(store.list_calls(RecordKind::Expenses), 2);
        assert_eq!(store.list_calls(RecordKind::Incomes), 0);
    }

    #[tokio::test]
    async fn test_open_persists_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let store = MemoryStore::open(&path).await.unwrap();
        store
            .delete(RecordKind::Expenses, "t", RecordId::new(1))
            .await
            .unwrap();
        let reopened = MemoryStore::open(&path).await.unwrap();
        assert_eq!(reopened.state().expenses.len(), 7);

        let mut state = reopened.state();
        state.currency = "INR".to_string();
        save_state(&path, &state).await.unwrap();
        let again = MemoryStore::open(&path).await.unwrap();
        assert_eq!(again.state().currency, "INR");
    }
}
