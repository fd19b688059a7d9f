//! The state of one session: the fetched ledger, the active filter and what the user has
//! selected.
//!
//! This is the only layer that swallows errors. Every failed store call is logged and leaves the
//! current data as it was; nothing here returns an error to the caller. Without a token every
//! fetch, create and delete is skipped.
//!
//! Each fetch is tagged with a generation for its feed. When two fetches of the same feed
//! overlap, only the most recently issued one is applied, whatever order they finish in.

use crate::aggregate::{self, ExpenseTotals, IncomeTotals, TypeSplit};
use crate::api::{Client, DeleteReport};
use crate::filter::{self, Filter, Period, Selector};
use crate::format::Currency;
use crate::model::{
    Activity, ActivityKey, Expense, ExpenseDraft, Income, IncomeDraft, LedgerData, PlanDraft,
    PlanSummary, Record, RecordId, RecordKind, SavingPlan,
};
use crate::session::Session;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

/// A stream of fetches whose results replace one part of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Expenses,
    Incomes,
    Plans,
    PlanSummary,
    Activity,
}

serde_plain::derive_display_from_serialize!(Feed);
serde_plain::derive_fromstr_from_deserialize!(Feed);

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    feed: Feed,
    generation: u64,
}

impl Ticket {
    pub fn feed(&self) -> Feed {
        self.feed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The lists that support selecting records for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    RegularExpenses,
    AdditionalExpenses,
    Incomes,
    Plans,
}

serde_plain::derive_display_from_serialize!(ListKind);
serde_plain::derive_fromstr_from_deserialize!(ListKind);

impl ListKind {
    pub fn record_kind(&self) -> RecordKind {
        match self {
            ListKind::RegularExpenses | ListKind::AdditionalExpenses => RecordKind::Expenses,
            ListKind::Incomes => RecordKind::Incomes,
            ListKind::Plans => RecordKind::Plans,
        }
    }
}

/// Whether a list is in edit mode, and which of its records are ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub editing: bool,
    pub selected: BTreeSet<RecordId>,
}

impl Selection {
    pub fn is_clear(&self) -> bool {
        !self.editing && self.selected.is_empty()
    }
}

/// What happened to a submitted draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The draft did not validate; nothing was sent.
    Blocked(String),
    /// There is no token; nothing was sent.
    Skipped,
    /// The store did not confirm the create.
    Failed,
    Created,
}

/// The state of one session.
pub struct Tracker {
    client: Client,
    session: Session,
    data: LedgerData,
    period: Period,
    category: Selector,
    source: Selector,
    activity_limit: usize,
    generations: BTreeMap<Feed, u64>,
    loading: bool,
    submitted: bool,
    selections: BTreeMap<ListKind, Selection>,
}

impl Tracker {
    pub fn new(client: Client, session: Session, period: Period, activity_limit: usize) -> Self {
        Self {
            client,
            session,
            data: LedgerData::default(),
            period,
            category: Selector::All,
            source: Selector::All,
            activity_limit,
            generations: BTreeMap::new(),
            loading: false,
            submitted: false,
            selections: BTreeMap::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn currency(&self) -> Currency {
        self.session.currency()
    }

    pub fn data(&self) -> &LedgerData {
        &self.data
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Set after a successful submission until cleared.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn clear_submitted(&mut self) {
        self.submitted = false;
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Changes the active period. Plans are per period, so the caller should refresh them.
    pub fn set_period(&mut self, period: Period) {
        self.period = period;
    }

    pub fn set_category(&mut self, selector: Selector) {
        self.category = selector;
    }

    pub fn set_source(&mut self, selector: Selector) {
        self.source = selector;
    }

    /// The filter of the expense page.
    pub fn expense_filter(&self) -> Filter {
        Filter::new(self.period, self.category.clone())
    }

    /// The filter of the income page.
    pub fn income_filter(&self) -> Filter {
        Filter::new(self.period, self.source.clone())
    }

    // Views

    /// The expenses of the active filter, split by type.
    pub fn expenses_by_type(&self) -> TypeSplit<'_> {
        let active = self.expense_filter();
        aggregate::split_by_type(self.data.expenses.iter().filter(|e| active.matches(*e)))
    }

    pub fn expense_totals(&self) -> ExpenseTotals {
        ExpenseTotals::compute(&self.data.expenses, &self.expense_filter())
    }

    pub fn incomes(&self) -> Vec<&Income> {
        let active = self.income_filter();
        self.data
            .incomes
            .iter()
            .filter(|i| active.matches(*i))
            .collect()
    }

    pub fn income_totals(&self) -> IncomeTotals {
        IncomeTotals::compute(
            &self.data.incomes,
            &self.data.expenses,
            &self.data.plans,
            self.data.plan_summary.as_ref(),
            &self.income_filter(),
        )
    }

    /// The plans of the active (month, year).
    pub fn plans(&self) -> Vec<&SavingPlan> {
        filter::plans_for(&self.data.plans, self.period.month, self.period.year).collect()
    }

    /// The recent activity that falls in the active period, newest first.
    pub fn recent_activity(&self) -> Vec<&Activity> {
        let period = self.period;
        aggregate::recent_activity_sorted(
            self.data
                .activity
                .iter()
                .filter(|a| period.contains(a.date())),
        )
    }

    /// The baseline order of the activity feed.
    pub fn activity_keys(&self) -> Vec<ActivityKey> {
        self.recent_activity().into_iter().map(Record::key).collect()
    }

    /// Names what `activity_keys` was derived from. It changes whenever the active period does.
    pub fn activity_source(&self) -> String {
        match self.period.day {
            Some(day) => format!("{}-{:02}-{:02}", self.period.year, self.period.month, day),
            None => format!("{}-{:02}", self.period.year, self.period.month),
        }
    }

    // Generations

    /// Issues a new ticket for `feed`. Results carrying any earlier ticket for the same feed will
    /// be discarded.
    pub fn issue(&mut self, feed: Feed) -> Ticket {
        let generation = self.generations.entry(feed).or_insert(0);
        *generation += 1;
        Ticket {
            feed,
            generation: *generation,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generations.get(&ticket.feed) == Some(&ticket.generation)
    }

    fn apply<T>(
        &mut self,
        ticket: Ticket,
        result: Result<T>,
        set: impl FnOnce(&mut LedgerData, T),
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding {} result of generation {}",
                ticket.feed, ticket.generation
            );
            return false;
        }
        match result {
            Ok(value) => {
                set(&mut self.data, value);
                true
            }
            Err(e) => {
                error!("Unable to refresh {}: {e:#}", ticket.feed);
                false
            }
        }
    }

    /// Applies a fetch of the expenses if `ticket` is still the latest for its feed. Returns
    /// whether the data was replaced.
    pub fn apply_expenses(&mut self, ticket: Ticket, result: Result<Vec<Expense>>) -> bool {
        self.apply(ticket, result, |data, v| data.expenses = v)
    }

    pub fn apply_incomes(&mut self, ticket: Ticket, result: Result<Vec<Income>>) -> bool {
        self.apply(ticket, result, |data, v| data.incomes = v)
    }

    pub fn apply_plans(&mut self, ticket: Ticket, result: Result<Vec<SavingPlan>>) -> bool {
        self.apply(ticket, result, |data, v| data.plans = v)
    }

    /// A failed summary fetch clears the summary, so planned totals fall back to the local
    /// plans.
    pub fn apply_plan_summary(&mut self, ticket: Ticket, result: Result<PlanSummary>) -> bool {
        let failed = result.is_err();
        let applied = self.apply(ticket, result, |data, v| data.plan_summary = Some(v));
        if failed && self.is_current(ticket) {
            self.data.plan_summary = None;
        }
        applied
    }

    pub fn apply_activity(&mut self, ticket: Ticket, result: Result<Vec<Activity>>) -> bool {
        self.apply(ticket, result, |data, v| data.activity = v)
    }

    // Refreshes

    fn token(&self) -> Option<String> {
        let token = self.session.token().map(str::to_string);
        if token.is_none() {
            debug!("No token, skipping the store call");
        }
        token
    }

    pub async fn refresh_expenses(&mut self) {
        let Some(token) = self.token() else {
            return;
        };
        let ticket = self.issue(Feed::Expenses);
        let result = self.client.expenses(&token).await;
        self.apply_expenses(ticket, result);
    }

    pub async fn refresh_incomes(&mut self) {
        let Some(token) = self.token() else {
            return;
        };
        let ticket = self.issue(Feed::Incomes);
        let result = self.client.incomes(&token).await;
        self.apply_incomes(ticket, result);
    }

    /// Refreshes the plans of the active period and their summary.
    pub async fn refresh_plans(&mut self) {
        let Some(token) = self.token() else {
            return;
        };
        let Period { month, year, .. } = self.period;
        let ticket = self.issue(Feed::Plans);
        let result = self.client.plans(&token, month, year).await;
        self.apply_plans(ticket, result);

        let ticket = self.issue(Feed::PlanSummary);
        let result = self.client.plan_summary(&token, month, year).await;
        self.apply_plan_summary(ticket, result);
    }

    pub async fn refresh_activity(&mut self) {
        let Some(token) = self.token() else {
            return;
        };
        let ticket = self.issue(Feed::Activity);
        let result = self.client.recent_activity(&token, self.activity_limit).await;
        self.apply_activity(ticket, result);
    }

    /// Refreshes everything, as when a page regains focus.
    pub async fn refresh_all(&mut self) {
        if self.session.token().is_none() {
            debug!("No token, nothing to refresh");
            return;
        }
        self.loading = true;
        self.refresh_expenses().await;
        self.refresh_incomes().await;
        self.refresh_plans().await;
        self.refresh_activity().await;
        self.loading = false;
    }

    // Submissions

    pub async fn submit_expense(&mut self, draft: &ExpenseDraft) -> Submission {
        let payload = match draft.validate(self.session.currency()) {
            Ok(payload) => payload,
            Err(e) => return blocked(e),
        };
        let Some(token) = self.token() else {
            return Submission::Skipped;
        };
        self.loading = true;
        let result = self.client.create_expense(&token, &payload).await;
        let submission = self.created(result, "expense");
        if submission == Submission::Created {
            self.refresh_expenses().await;
            self.refresh_activity().await;
        }
        self.loading = false;
        submission
    }

    pub async fn submit_income(&mut self, draft: &IncomeDraft) -> Submission {
        let payload = match draft.validate() {
            Ok(payload) => payload,
            Err(e) => return blocked(e),
        };
        let Some(token) = self.token() else {
            return Submission::Skipped;
        };
        self.loading = true;
        let result = self.client.create_income(&token, &payload).await;
        let submission = self.created(result, "income");
        if submission == Submission::Created {
            self.refresh_incomes().await;
            self.refresh_expenses().await;
            self.refresh_activity().await;
        }
        self.loading = false;
        submission
    }

    /// The plan is created for the active (month, year).
    pub async fn submit_plan(&mut self, draft: &PlanDraft) -> Submission {
        let payload = match draft.validate(self.period.month, self.period.year) {
            Ok(payload) => payload,
            Err(e) => return blocked(e),
        };
        let Some(token) = self.token() else {
            return Submission::Skipped;
        };
        self.loading = true;
        let result = self.client.create_plan(&token, &payload).await;
        let submission = self.created(result, "saving plan");
        if submission == Submission::Created {
            self.refresh_plans().await;
        }
        self.loading = false;
        submission
    }

    fn created<T>(&mut self, result: Result<T>, what: &str) -> Submission {
        match result {
            Ok(_) => {
                self.submitted = true;
                Submission::Created
            }
            Err(e) => {
                error!("Unable to add the {what}: {e:#}");
                Submission::Failed
            }
        }
    }

    // Selection and deletion

    pub fn selection(&self, list: ListKind) -> Selection {
        self.selections.get(&list).cloned().unwrap_or_default()
    }

    pub fn set_editing(&mut self, list: ListKind, editing: bool) {
        let selection = self.selections.entry(list).or_default();
        selection.editing = editing;
        if !editing {
            selection.selected.clear();
        }
    }

    /// Ticks `id` if it is not ticked, unticks it otherwise. Ticking puts the list in edit mode.
    pub fn toggle_selected(&mut self, list: ListKind, id: RecordId) {
        let selection = self.selections.entry(list).or_default();
        selection.editing = true;
        if !selection.selected.remove(&id) {
            selection.selected.insert(id);
        }
    }

    /// Leaves edit mode and unticks everything in every list that shows records of `kind`.
    pub fn clear_selections(&mut self, kind: RecordKind) {
        self.selections.retain(|list, _| list.record_kind() != kind);
    }

    /// Deletes the ticked records of `list`.
    pub async fn delete_selected(&mut self, list: ListKind) -> DeleteReport {
        let ids: Vec<RecordId> = self.selection(list).selected.into_iter().collect();
        self.delete_many(list.record_kind(), ids).await
    }

    /// Deletes every id in `ids`, one at a time, then refreshes once and clears the selections.
    /// Ids that fail to delete are reported and stay in the store.
    pub async fn delete_many(&mut self, kind: RecordKind, ids: Vec<RecordId>) -> DeleteReport {
        let Some(token) = self.token() else {
            return DeleteReport::default();
        };
        if ids.is_empty() {
            self.clear_selections(kind);
            return DeleteReport::default();
        }
        self.loading = true;
        let report = self.client.delete_many(kind, &token, ids).await;
        if !report.is_complete() {
            warn!(
                "{} of {} {kind} could not be deleted",
                report.failed.len(),
                report.failed.len() + report.deleted.len()
            );
        }
        match kind {
            RecordKind::Expenses => self.refresh_expenses().await,
            RecordKind::Incomes => self.refresh_incomes().await,
            RecordKind::Plans => self.refresh_plans().await,
        }
        if kind != RecordKind::Plans {
            self.refresh_activity().await;
        }
        self.clear_selections(kind);
        self.loading = false;
        report
    }
}

fn blocked(e: crate::Error) -> Submission {
    warn!("{e:#}");
    Submission::Blocked(format!("{e:#}"))
}
