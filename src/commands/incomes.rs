//! Handlers for `mmt incomes`.

use crate::aggregate::IncomeTotals;
use crate::api::{DeleteReport, Mode};
use crate::args::{DeleteArgs, IncomeAddArgs, IncomeListArgs};
use crate::commands::{
    check_submission, delete_message, describe, month_of, open_tracker, render_rows,
    render_total, Out, Row,
};
use crate::filter::Period;
use crate::format::Currency;
use crate::model::{IncomeDraft, RecordKind};
use crate::tracker::Tracker;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Write;

/// The income page: the incomes of one period, and how they compare with the month's expenses
/// and saving plans.
#[derive(Debug, Clone, Serialize)]
pub struct IncomePage {
    pub period: Period,
    pub source: String,
    pub currency: Currency,
    pub incomes: Vec<Row>,
    pub totals: IncomeTotals,
}

impl IncomePage {
    pub(crate) fn new(tracker: &Tracker) -> Self {
        let currency = tracker.currency();
        Self {
            period: tracker.period(),
            source: tracker.income_filter().selector.to_string(),
            currency,
            incomes: tracker
                .incomes()
                .into_iter()
                .map(|i| Row::income(i, currency))
                .collect(),
            totals: tracker.income_totals(),
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut out = format!("Incomes for {} ({})\n\n", describe(self.period), self.source);
        render_rows(&mut out, "Incomes", &self.incomes);
        out.push('\n');
        let t = &self.totals;
        let c = self.currency;
        render_total(&mut out, "Monthly income", t.monthly_income, c);
        render_total(&mut out, "Monthly expenses", t.monthly_expenses, c);
        render_total(&mut out, "Monthly savings", t.monthly_savings, c);
        render_total(&mut out, "Planned savings", t.effective_planned, c);
        render_total(&mut out, "Remaining savings", t.remaining_savings, c);
        render_total(&mut out, "Yearly income", t.yearly_income, c);
        render_total(&mut out, "All-time income", t.all_time_income, c);
        let _ = writeln!(out, "{:<22} {:>12}", "Saving plans", t.plan_count);
        out
    }
}

/// Handles `mmt incomes list`.
pub async fn list_incomes(
    config: Config,
    mode: Mode,
    args: &IncomeListArgs,
) -> Result<Out<IncomePage>> {
    let mut tracker = open_tracker(&config, mode, args.period()).await?;
    tracker.set_source(args.source().clone());
    tracker.refresh_incomes().await;
    tracker.refresh_expenses().await;
    tracker.refresh_plans().await;
    let page = IncomePage::new(&tracker);
    Ok(Out::new(page.render(), page))
}

/// Handles `mmt incomes add`.
pub async fn add_income(
    config: Config,
    mode: Mode,
    args: &IncomeAddArgs,
) -> Result<Out<IncomePage>> {
    let draft = IncomeDraft {
        source: args.source().to_string(),
        amount: args.amount().to_string(),
        date: args.date(),
        notes: args.notes().to_string(),
    };
    let mut tracker = open_tracker(&config, mode, month_of(&draft.date)).await?;
    let submission = tracker.submit_income(&draft).await;
    check_submission(submission, "income")?;
    tracker.refresh_plans().await;
    let page = IncomePage::new(&tracker);
    let message = format!("Added an income from {}\n\n{}", draft.source, page.render());
    Ok(Out::new(message, page))
}

/// Handles `mmt incomes delete`.
pub async fn delete_incomes(
    config: Config,
    mode: Mode,
    args: &DeleteArgs,
) -> Result<Out<DeleteReport>> {
    let mut tracker = open_tracker(&config, mode, month_of("")).await?;
    let report = tracker
        .delete_many(RecordKind::Incomes, args.ids().to_vec())
        .await;
    Ok(Out::new(delete_message(&report, "income", "incomes"), report))
}
