//! Handlers for `mmt expenses`.

use crate::aggregate::ExpenseTotals;
use crate::api::{DeleteReport, Mode};
use crate::args::{DeleteArgs, ExpenseAddArgs, ExpenseListArgs};
use crate::commands::{
    check_submission, delete_message, describe, month_of, open_tracker, render_rows,
    render_total, Out, Row,
};
use crate::filter::Period;
use crate::format::Currency;
use crate::model::{Expense, ExpenseDraft, RecordKind};
use crate::tracker::Tracker;
use crate::{Config, Result};
use serde::Serialize;

/// The expense page: the expenses of one period split by type, and their totals.
#[derive(Debug, Clone, Serialize)]
pub struct ExpensePage {
    pub period: Period,
    pub category: String,
    pub currency: Currency,
    pub regular: Vec<Row>,
    pub additional: Vec<Row>,
    /// Expenses whose type is neither regular nor additional. They are listed but not counted.
    pub unclassified: Vec<Row>,
    pub totals: ExpenseTotals,
}

impl ExpensePage {
    pub(crate) fn new(tracker: &Tracker) -> Self {
        let currency = tracker.currency();
        let split = tracker.expenses_by_type();
        let rows = |list: &[&Expense]| {
            list.iter()
                .map(|e| Row::expense(e, currency))
                .collect::<Vec<_>>()
        };
        Self {
            period: tracker.period(),
            category: tracker.expense_filter().selector.to_string(),
            currency,
            regular: rows(&split.regular),
            additional: rows(&split.additional),
            unclassified: rows(&split.unclassified),
            totals: tracker.expense_totals(),
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut out = format!(
            "Expenses for {} ({})\n\n",
            describe(self.period),
            self.category
        );
        render_rows(&mut out, "Regular", &self.regular);
        out.push('\n');
        render_rows(&mut out, "Additional", &self.additional);
        if !self.unclassified.is_empty() {
            out.push('\n');
            render_rows(&mut out, "Unclassified (not counted)", &self.unclassified);
        }
        out.push('\n');
        let t = &self.totals;
        render_total(&mut out, "Regular total", t.regular, self.currency);
        render_total(&mut out, "Additional total", t.additional, self.currency);
        render_total(&mut out, "Monthly total", t.monthly, self.currency);
        render_total(&mut out, "Yearly total", t.yearly, self.currency);
        render_total(&mut out, "All-time total", t.all_time, self.currency);
        out
    }
}

/// Handles `mmt expenses list`.
pub async fn list_expenses(
    config: Config,
    mode: Mode,
    args: &ExpenseListArgs,
) -> Result<Out<ExpensePage>> {
    let mut tracker = open_tracker(&config, mode, args.period()).await?;
    tracker.set_category(args.category().clone());
    tracker.refresh_expenses().await;
    let page = ExpensePage::new(&tracker);
    Ok(Out::new(page.render(), page))
}

/// Handles `mmt expenses add`. On success the page of the month the expense falls in is
/// returned.
pub async fn add_expense(
    config: Config,
    mode: Mode,
    args: &ExpenseAddArgs,
) -> Result<Out<ExpensePage>> {
    let draft = ExpenseDraft {
        category: args.category().to_string(),
        amount: args.amount().to_string(),
        date: args.date(),
        notes: args.notes().to_string(),
        expense_type: args.expense_type(),
    };
    let mut tracker = open_tracker(&config, mode, month_of(&draft.date)).await?;
    let submission = tracker.submit_expense(&draft).await;
    check_submission(submission, "expense")?;
    let page = ExpensePage::new(&tracker);
    let message = format!(
        "Added a {} expense for {}\n\n{}",
        draft.expense_type,
        draft.category,
        page.render()
    );
    Ok(Out::new(message, page))
}

/// Handles `mmt expenses delete`. Ids that cannot be deleted are reported, not fatal.
pub async fn delete_expenses(
    config: Config,
    mode: Mode,
    args: &DeleteArgs,
) -> Result<Out<DeleteReport>> {
    let mut tracker = open_tracker(&config, mode, month_of("")).await?;
    let report = tracker
        .delete_many(RecordKind::Expenses, args.ids().to_vec())
        .await;
    Ok(Out::new(
        delete_message(&report, "expense", "expenses"),
        report,
    ))
}
