use crate::aggregate::{ExpenseTotals, IncomeTotals};
use crate::api::Mode;
use crate::args::SummaryArgs;
use crate::commands::{describe, open_tracker, render_rows, render_total, Out, Row};
use crate::filter::Period;
use crate::format::{Currency, Tone};
use crate::{Config, Result};
use serde::Serialize;

/// Everything the dashboard shows for one period.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryPage {
    pub period: Period,
    pub currency: Currency,
    pub expenses: ExpenseTotals,
    pub incomes: IncomeTotals,
    /// Whether the month's remaining savings are above or below zero.
    pub tone: Tone,
    pub recent_activity: Vec<Row>,
}

impl SummaryPage {
    fn render(&self) -> String {
        let c = self.currency;
        let mut out = format!("Summary for {}\n\n", describe(self.period));
        render_total(&mut out, "Income", self.incomes.monthly_income, c);
        render_total(&mut out, "Regular expenses", self.expenses.regular, c);
        render_total(&mut out, "Additional expenses", self.expenses.additional, c);
        render_total(&mut out, "Expenses", self.incomes.monthly_expenses, c);
        render_total(&mut out, "Savings", self.incomes.monthly_savings, c);
        render_total(&mut out, "Planned savings", self.incomes.effective_planned, c);
        render_total(&mut out, "Remaining savings", self.incomes.remaining_savings, c);
        if self.tone == Tone::Negative {
            out.push_str("Your saving plans exceed what is left this period.\n");
        }
        out.push('\n');
        render_rows(&mut out, "Recent activity", &self.recent_activity);
        out
    }
}

/// Handles `mmt summary`.
pub async fn summary(config: Config, mode: Mode, args: &SummaryArgs) -> Result<Out<SummaryPage>> {
    let mut tracker = open_tracker(&config, mode, args.period()).await?;
    tracker.set_category(args.category().clone());
    tracker.set_source(args.source().clone());
    tracker.refresh_all().await;

    let currency = tracker.currency();
    let incomes = tracker.income_totals();
    let page = SummaryPage {
        period: tracker.period(),
        currency,
        expenses: tracker.expense_totals(),
        tone: Tone::of(incomes.remaining_savings),
        incomes,
        recent_activity: tracker
            .recent_activity()
            .into_iter()
            .map(|a| Row::activity(a, currency))
            .collect(),
    };
    Ok(Out::new(page.render(), page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PeriodArgs;
    use crate::filter::Selector;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_summary() {
        let env = TestEnv::new().await;
        let args = SummaryArgs::new(
            PeriodArgs::new(Some(10), Some(2026), None),
            Selector::All,
            Selector::All,
        );
        let out = summary(env.config(), env.mode(), &args).await.unwrap();
        let page = out.structure().unwrap();
        assert_eq!(page.tone, Tone::Positive);
        assert_eq!(page.incomes.remaining_savings, Decimal::new(264127, 2));
        assert_eq!(page.recent_activity.len(), 3);
        assert_eq!(page.recent_activity[0].label, "Groceries (expense)");
        assert!(!out.message().contains("exceed"));
    }

    #[tokio::test]
    async fn test_summary_overspent() {
        let env = TestEnv::new().await;
        let args = SummaryArgs::new(
            PeriodArgs::new(Some(9), Some(2026), None),
            Selector::All,
            Selector::All,
        );
        let mut state = env.state().await;
        state.incomes.retain(|i| i["id"] != 103);
        env.set_state(state).await;
        let out = summary(env.config(), env.mode(), &args).await.unwrap();
        let page = out.structure().unwrap();
        assert_eq!(page.tone, Tone::Negative);
        assert!(page.recent_activity.is_empty());
        assert!(out.message().contains("exceed"));
    }
}
