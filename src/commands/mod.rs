//! Command handlers for the mmt CLI.
//!
//! This module contains implementations for all CLI subcommands. Each handler builds a `Tracker`
//! for the period it was asked about, does its work through it, and returns an `Out` holding a
//! rendered page of text along with the same data in structured form.

mod activity;
mod auth;
mod expenses;
mod incomes;
mod init;
mod plans;
mod summary;

use crate::api::{self, Client, Mode};
use crate::error::{tagged, ErrorType};
use crate::filter::Period;
use crate::format::{self, Currency};
use crate::model::{Activity, Expense, Income, LedgerDate, Record, RecordId, SavingPlan};
use crate::session::Session;
use crate::tracker::{Submission, Tracker};
use crate::{Config, Result};
use anyhow::{anyhow, bail};
use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{Debug, Write};
use tracing::{debug, info};

pub use activity::{activity, ActivityFrame};
pub use auth::{auth, auth_clear};
pub use expenses::{add_expense, delete_expenses, list_expenses, ExpensePage};
pub use incomes::{add_income, delete_incomes, list_incomes, IncomePage};
pub use init::init;
pub use plans::{add_plan, delete_plans, list_plans, PlanPage};
pub use summary::{summary, SummaryPage};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Connects to the store chosen by `mode`, starts the session and builds a tracker for `period`.
/// Commands that read or change records fail here when there is no token, since the tracker
/// would otherwise silently do nothing.
pub(crate) async fn open_tracker(config: &Config, mode: Mode, period: Period) -> Result<Tracker> {
    let store = api::store(config, mode).await?;
    let client = Client::new(store);
    let session = Session::start(config, &client).await?;
    if session.token().is_none() {
        return Err(tagged(
            ErrorType::MissingAuth,
            anyhow!("You are not signed in, run 'mmt auth --token <TOKEN>' first"),
        ));
    }
    Ok(Tracker::new(client, session, period, config.activity_limit()))
}

/// One line of a rendered list, with the amount and date already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub id: RecordId,
    pub date: String,
    pub label: String,
    pub amount: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Row {
    pub(crate) fn expense(e: &Expense, currency: Currency) -> Self {
        Self {
            id: e.id(),
            date: format::format_date(e.date()),
            label: e.category().to_string(),
            amount: format::format_money(Some(e.amount().value()), currency),
            notes: e.notes().to_string(),
        }
    }

    pub(crate) fn income(i: &Income, currency: Currency) -> Self {
        Self {
            id: i.id(),
            date: format::format_date(i.date()),
            label: i.source().to_string(),
            amount: format::format_money(Some(i.amount().value()), currency),
            notes: i.notes().to_string(),
        }
    }

    pub(crate) fn plan(p: &SavingPlan, currency: Currency) -> Self {
        Self {
            id: p.id(),
            date: format!("{}/{}", p.month(), p.year()),
            label: p.category().to_string(),
            amount: format::format_money(Some(p.amount().value()), currency),
            notes: String::new(),
        }
    }

    pub(crate) fn activity(a: &Activity, currency: Currency) -> Self {
        Self {
            id: a.id(),
            date: format::format_date(a.date()),
            label: format!("{} ({})", a.label(), a.kind()),
            amount: format::format_money(Some(a.amount().value()), currency),
            notes: a.notes().to_string(),
        }
    }
}

/// Appends a titled list of rows to `out`.
pub(crate) fn render_rows(out: &mut String, title: &str, rows: &[Row]) {
    let _ = writeln!(out, "{title}");
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    for row in rows {
        let _ = write!(
            out,
            "  #{:<5} {:<13} {:<20} {:>12}",
            row.id, row.date, row.label, row.amount
        );
        if !row.notes.is_empty() {
            let _ = write!(out, "  {}", row.notes);
        }
        out.push('\n');
    }
}

/// Appends `label: amount` to `out`.
pub(crate) fn render_total(out: &mut String, label: &str, value: Decimal, currency: Currency) {
    let _ = writeln!(
        out,
        "{label:<22} {:>12}",
        format::format_money(Some(value), currency)
    );
}

/// A short human name for a period, e.g. `10/2026` or `15/10/2026`.
pub(crate) fn describe(period: Period) -> String {
    match period.day {
        Some(day) => format!("{day}/{}/{}", period.month, period.year),
        None => format!("{}/{}", period.month, period.year),
    }
}

/// The month that `date` falls in, or the current month when `date` is not a date.
pub(crate) fn month_of(date: &str) -> Period {
    let date = LedgerDate::parse(date)
        .date()
        .unwrap_or_else(|| Local::now().date_naive());
    Period::month(date.month(), date.year())
}

/// Turns the outcome of a submission into an error unless the record was created.
pub(crate) fn check_submission(submission: Submission, what: &str) -> Result<()> {
    match submission {
        Submission::Created => Ok(()),
        Submission::Blocked(reason) => Err(tagged(ErrorType::Validation, anyhow!(reason))),
        Submission::Skipped => Err(tagged(
            ErrorType::MissingAuth,
            anyhow!("The {what} was not sent because there is no token"),
        )),
        Submission::Failed => bail!("The record store did not accept the {what}"),
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

/// The message shared by the delete commands.
pub(crate) fn delete_message(report: &api::DeleteReport, one: &str, many: &str) -> String {
    let mut message = format!("Deleted {}", plural(report.deleted.len(), one, many));
    if !report.is_complete() {
        let failed: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
        let _ = write!(
            message,
            ", unable to delete {}: {}",
            plural(report.failed.len(), one, many),
            failed.join(", ")
        );
    }
    message
}
