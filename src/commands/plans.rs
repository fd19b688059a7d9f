//! Handlers for `mmt plans`.

use crate::api::{DeleteReport, Mode};
use crate::args::{DeleteArgs, PlanAddArgs, PlanListArgs};
use crate::commands::{
    check_submission, delete_message, describe, month_of, open_tracker, render_rows,
    render_total, Out, Row,
};
use crate::filter::Period;
use crate::format::Currency;
use crate::model::{PlanDraft, RecordKind};
use crate::tracker::Tracker;
use crate::{aggregate, Config, Result};
use rust_decimal::Decimal;
use serde::Serialize;

/// The saving plans of one month.
#[derive(Debug, Clone, Serialize)]
pub struct PlanPage {
    pub month: u32,
    pub year: i32,
    pub currency: Currency,
    pub plans: Vec<Row>,
    /// The store's total when it has one, otherwise the sum of `plans`.
    pub planned: Decimal,
}

impl PlanPage {
    pub(crate) fn new(tracker: &Tracker) -> Self {
        let currency = tracker.currency();
        let Period { month, year, .. } = tracker.period();
        Self {
            month,
            year,
            currency,
            plans: tracker
                .plans()
                .into_iter()
                .map(|p| Row::plan(p, currency))
                .collect(),
            planned: aggregate::planned_total(
                tracker.data().plan_summary(),
                tracker.data().plans(),
                month,
                year,
            ),
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut out = format!(
            "Saving plans for {}\n\n",
            describe(Period::month(self.month, self.year))
        );
        render_rows(&mut out, "Plans", &self.plans);
        out.push('\n');
        render_total(&mut out, "Planned total", self.planned, self.currency);
        out
    }
}

/// Handles `mmt plans list`. A plan belongs to a month, so `--day` is ignored.
pub async fn list_plans(config: Config, mode: Mode, args: &PlanListArgs) -> Result<Out<PlanPage>> {
    let mut tracker = open_tracker(&config, mode, args.period()).await?;
    tracker.refresh_plans().await;
    let page = PlanPage::new(&tracker);
    Ok(Out::new(page.render(), page))
}

/// Handles `mmt plans add`. The plan is added to the month given by `--month` and `--year`.
pub async fn add_plan(config: Config, mode: Mode, args: &PlanAddArgs) -> Result<Out<PlanPage>> {
    let draft = PlanDraft {
        category: args.category().to_string(),
        amount: args.amount().to_string(),
    };
    let mut tracker = open_tracker(&config, mode, args.period()).await?;
    let submission = tracker.submit_plan(&draft).await;
    check_submission(submission, "saving plan")?;
    let page = PlanPage::new(&tracker);
    let message = format!("Added a saving plan for {}\n\n{}", draft.category, page.render());
    Ok(Out::new(message, page))
}

/// Handles `mmt plans delete`.
pub async fn delete_plans(
    config: Config,
    mode: Mode,
    args: &DeleteArgs,
) -> Result<Out<DeleteReport>> {
    let mut tracker = open_tracker(&config, mode, month_of("")).await?;
    let report = tracker
        .delete_many(RecordKind::Plans, args.ids().to_vec())
        .await;
    Ok(Out::new(
        delete_message(&report, "saving plan", "saving plans"),
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PeriodArgs;
    use crate::error::{error_type, ErrorType};
    use crate::model::RecordId;
    use crate::test::TestEnv;

    fn month(m: u32) -> PeriodArgs {
        PeriodArgs::new(Some(m), Some(2026), None)
    }

    #[tokio::test]
    async fn test_list_plans() {
        let env = TestEnv::new().await;
        let out = list_plans(env.config(), env.mode(), &PlanListArgs::new(month(10)))
            .await
            .unwrap();
        let page = out.structure().unwrap();
        assert_eq!(page.plans.len(), 2);
        assert_eq!(page.planned, Decimal::from(750));
        assert!(out.message().contains("Emergency Fund"));
    }

    #[tokio::test]
    async fn test_add_plan() {
        let env = TestEnv::new().await;
        let args = PlanAddArgs::new(month(12), "Travel Fund", "80");
        let out = add_plan(env.config(), env.mode(), &args).await.unwrap();
        let page = out.structure().unwrap();
        assert_eq!((page.month, page.year), (12, 2026));
        assert_eq!(page.plans.len(), 1);
        assert_eq!(page.planned, Decimal::from(80));
    }

    #[tokio::test]
    async fn test_add_plan_unknown_category() {
        let env = TestEnv::new().await;
        let args = PlanAddArgs::new(month(12), "Yacht", "80");
        let e = add_plan(env.config(), env.mode(), &args).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
    }

    #[tokio::test]
    async fn test_delete_plans() {
        let env = TestEnv::new().await;
        let args = DeleteArgs::new(vec![RecordId::new(203)]);
        let out = delete_plans(env.config(), env.mode(), &args).await.unwrap();
        assert_eq!(out.message(), "Deleted 1 saving plan");
        assert_eq!(env.state().await.plans.len(), 2);
    }
}
