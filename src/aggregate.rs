//! Totals over the ledger.
//!
//! These are pure functions of the records handed in; none of them can fail. Amounts are summed
//! as `Decimal`, so the totals are exact.

use crate::filter::{self, Filter, Selector};
use crate::model::{Expense, ExpenseType, Income, PlanSummary, Record, SavingPlan, Valued};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Sum of the amounts of `records`. Empty input sums to zero.
pub fn sum_amount<'a, V, I>(records: I) -> Decimal
where
    V: Valued + 'a,
    I: IntoIterator<Item = &'a V>,
{
    records.into_iter().map(Valued::value).sum()
}

/// Expenses partitioned by their type.
///
/// Expenses whose type is neither `regular` nor `additional` land in `unclassified`; they are
/// shown, but they count toward neither sum nor the monthly total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSplit<'a> {
    pub regular: Vec<&'a Expense>,
    pub additional: Vec<&'a Expense>,
    pub unclassified: Vec<&'a Expense>,
}

impl<'a> TypeSplit<'a> {
    pub fn regular_total(&self) -> Decimal {
        sum_amount(self.regular.iter().copied())
    }

    pub fn additional_total(&self) -> Decimal {
        sum_amount(self.additional.iter().copied())
    }

    /// `regular_total + additional_total`.
    pub fn monthly_total(&self) -> Decimal {
        self.regular_total() + self.additional_total()
    }
}

pub fn split_by_type<'a, I>(expenses: I) -> TypeSplit<'a>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut split = TypeSplit::default();
    for expense in expenses {
        match expense.expense_type() {
            ExpenseType::Regular => split.regular.push(expense),
            ExpenseType::Additional => split.additional.push(expense),
            ExpenseType::Unknown(_) => split.unclassified.push(expense),
        }
    }
    split
}

/// The roll-up shown on the expense page for the active filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseTotals {
    pub regular: Decimal,
    pub additional: Decimal,
    pub unclassified: Decimal,
    /// `regular + additional` for the active period and selector.
    pub monthly: Decimal,
    /// Every expense in the active year, whatever its category.
    pub yearly: Decimal,
    /// Every expense, unfiltered.
    pub all_time: Decimal,
}

impl ExpenseTotals {
    pub fn compute(expenses: &[Expense], active: &Filter) -> Self {
        let split = split_by_type(filter::filter(expenses, active));
        Self {
            regular: split.regular_total(),
            additional: split.additional_total(),
            unclassified: sum_amount(split.unclassified.iter().copied()),
            monthly: split.monthly_total(),
            yearly: sum_amount(filter::in_year(expenses, active.period.year)),
            all_time: sum_amount(expenses),
        }
    }
}

/// The planned-savings total for (month, year).
///
/// The store's summary wins when it is present and non-zero. Otherwise the local plans for the
/// period are summed, so a missing or stale summary never hides plans the user can see.
pub fn planned_total(
    summary: Option<&PlanSummary>,
    plans: &[SavingPlan],
    month: u32,
    year: i32,
) -> Decimal {
    match summary.map(|s| s.total_planned().value()) {
        Some(total) if !total.is_zero() => total,
        _ => sum_amount(filter::plans_for(plans, month, year)),
    }
}

/// `(income - expenses) - planned`. Not clamped; a negative value means the plans overshoot what
/// is left.
pub fn remaining_savings(income: Decimal, expenses: Decimal, planned: Decimal) -> Decimal {
    (income - expenses) - planned
}

/// The roll-up shown on the income page for the active filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeTotals {
    /// Incomes in the active period that match the source selector.
    pub monthly_income: Decimal,
    /// Every expense in the active period, whatever its category.
    pub monthly_expenses: Decimal,
    /// `monthly_income - monthly_expenses`.
    pub monthly_savings: Decimal,
    /// Every income in the active year, whatever its source.
    pub yearly_income: Decimal,
    pub all_time_income: Decimal,
    /// Sum of the local plans for the active (month, year).
    pub computed_planned: Decimal,
    /// What `remaining_savings` uses; see `planned_total`.
    pub effective_planned: Decimal,
    pub remaining_savings: Decimal,
    pub plan_count: usize,
}

impl IncomeTotals {
    pub fn compute(
        incomes: &[Income],
        expenses: &[Expense],
        plans: &[SavingPlan],
        summary: Option<&PlanSummary>,
        active: &Filter,
    ) -> Self {
        let period = active.period;
        let monthly_income = sum_amount(filter::filter(incomes, active));
        let all_expenses = Filter::new(period, Selector::All);
        let monthly_expenses = sum_amount(filter::filter(expenses, &all_expenses));
        let computed_planned = sum_amount(filter::plans_for(plans, period.month, period.year));
        let effective_planned = planned_total(summary, plans, period.month, period.year);
        let plan_count = match summary {
            Some(s) if s.count() > 0 => usize::try_from(s.count()).unwrap_or(usize::MAX),
            _ => filter::plans_for(plans, period.month, period.year).count(),
        };
        Self {
            monthly_income,
            monthly_expenses,
            monthly_savings: monthly_income - monthly_expenses,
            yearly_income: sum_amount(filter::in_year(incomes, period.year)),
            all_time_income: sum_amount(incomes),
            computed_planned,
            effective_planned,
            remaining_savings: remaining_savings(
                monthly_income,
                monthly_expenses,
                effective_planned,
            ),
            plan_count,
        }
    }
}

/// Orders records newest first. Records with the same date are ordered by key, highest first.
/// Records whose date could not be parsed go last, also by key.
pub fn recent_activity_sort<R: Record>(records: &mut [R]) {
    records.sort_by(compare_recent);
}

/// Like `recent_activity_sort` for a borrowed selection.
pub fn recent_activity_sorted<'a, R, I>(records: I) -> Vec<&'a R>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut sorted: Vec<&R> = records.into_iter().collect();
    sorted.sort_by(|a, b| compare_recent(*a, *b));
    sorted
}

fn compare_recent<R: Record>(a: &R, b: &R) -> Ordering {
    match (a.date().date(), b.date().date()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.key().cmp(&a.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Period;
    use crate::model::{Activity, ActivityKind, Amount, LedgerDate, RecordId};
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn expense(id: u64, t: &str, amount: &str, date: &str) -> Expense {
        Expense::new(
            id,
            "Other",
            amt(amount),
            LedgerDate::parse(date),
            t.parse().unwrap(),
        )
    }

    fn income(id: u64, amount: &str, date: &str) -> Income {
        Income::new(id, "Salary", amt(amount), LedgerDate::parse(date))
    }

    #[test]
    fn test_sum_empty() {
        let none: Vec<Expense> = Vec::new();
        assert_eq!(sum_amount(&none), Decimal::ZERO);
    }

    #[test]
    fn test_regular_and_additional_for_january() {
        let expenses = vec![
            expense(1, "regular", "50", "2026-01-05"),
            expense(2, "additional", "20", "2026-01-10"),
        ];
        let active = Filter::new(Period::month(1, 2026), Selector::All);
        let totals = ExpenseTotals::compute(&expenses, &active);
        assert_eq!(totals.regular, dec("50"));
        assert_eq!(totals.additional, dec("20"));
        assert_eq!(totals.monthly, dec("70"));
    }

    #[test]
    fn test_unclassified_excluded_from_totals() {
        let expenses = vec![
            expense(1, "regular", "50", "2026-01-05"),
            expense(2, "weekly", "999", "2026-01-06"),
            expense(3, "additional", "20", "2026-01-10"),
        ];
        let split = split_by_type(&expenses);
        assert_eq!(split.unclassified.len(), 1);
        assert_eq!(split.monthly_total(), dec("70"));
        assert_eq!(
            split.monthly_total(),
            split.regular_total() + split.additional_total()
        );
    }

    #[test]
    fn test_yearly_and_all_time() {
        let expenses = vec![
            expense(1, "regular", "50", "2026-01-05"),
            expense(2, "additional", "20", "2026-04-10"),
            expense(3, "additional", "5", "2025-12-31"),
            expense(4, "additional", "1", "bad date"),
        ];
        for month in [1, 4, 7] {
            let active = Filter::new(Period::month(month, 2026), Selector::All);
            let totals = ExpenseTotals::compute(&expenses, &active);
            assert_eq!(totals.yearly, dec("70"));
            assert_eq!(totals.all_time, sum_amount(&expenses));
            assert_eq!(totals.all_time, dec("76"));
        }
    }

    #[test]
    fn test_yearly_totals_ignore_selector() {
        let rent = Expense::new(
            1,
            "Rent",
            amt("100"),
            LedgerDate::parse("2026-02-01"),
            ExpenseType::Regular,
        );
        let dining = Expense::new(
            2,
            "Dining",
            amt("30"),
            LedgerDate::parse("2026-02-03"),
            ExpenseType::Additional,
        );
        let expenses = vec![rent, dining];
        let active = Filter::new(Period::month(2, 2026), "Dining".parse().unwrap());
        let totals = ExpenseTotals::compute(&expenses, &active);
        assert_eq!(totals.monthly, dec("30"));
        assert_eq!(totals.yearly, dec("130"));

        let incomes = vec![
            income(1, "1000", "2026-02-01"),
            Income::new(2, "Gift", amt("10"), LedgerDate::parse("2026-02-02")),
        ];
        let active = Filter::new(Period::month(2, 2026), "Gift".parse().unwrap());
        let totals = IncomeTotals::compute(&incomes, &expenses, &[], None, &active);
        assert_eq!(totals.monthly_income, dec("10"));
        assert_eq!(totals.yearly_income, dec("1010"));
    }

    #[test]
    fn test_remaining_savings_without_plans() {
        let incomes = vec![income(1, "1000", "2026-03-01")];
        let expenses = vec![expense(1, "regular", "300", "2026-03-02")];
        let active = Filter::new(Period::month(3, 2026), Selector::All);
        let totals = IncomeTotals::compute(&incomes, &expenses, &[], None, &active);
        assert_eq!(totals.monthly_savings, dec("700"));
        assert_eq!(totals.effective_planned, Decimal::ZERO);
        assert_eq!(totals.remaining_savings, dec("700"));
    }

    #[test]
    fn test_remaining_savings_can_go_negative() {
        let incomes = vec![income(1, "100", "2026-03-01")];
        let expenses = vec![expense(1, "regular", "80", "2026-03-02")];
        let plans = vec![SavingPlan::new(1, "Travel Fund", amt("50"), 3, 2026)];
        let active = Filter::new(Period::month(3, 2026), Selector::All);
        let totals = IncomeTotals::compute(&incomes, &expenses, &plans, None, &active);
        assert_eq!(totals.remaining_savings, dec("-30"));
        assert_eq!(
            totals.remaining_savings,
            (totals.monthly_income - totals.monthly_expenses) - totals.effective_planned
        );
    }

    #[test]
    fn test_monthly_expenses_ignore_source_selector() {
        let incomes = vec![
            income(1, "1000", "2026-03-01"),
            Income::new(2, "Gift", amt("10"), LedgerDate::parse("2026-03-01")),
        ];
        let dining = Expense::new(
            1,
            "Dining",
            amt("300"),
            LedgerDate::parse("2026-03-02"),
            ExpenseType::Regular,
        );
        let expenses = vec![dining, expense(2, "additional", "5", "2026-03-03")];
        let active = Filter::new(Period::month(3, 2026), "Gift".parse().unwrap());
        let totals = IncomeTotals::compute(&incomes, &expenses, &[], None, &active);
        assert_eq!(totals.monthly_income, dec("10"));
        assert_eq!(totals.monthly_expenses, dec("305"));
        assert_eq!(totals.all_time_income, dec("1010"));
    }

    #[test]
    fn test_planned_total_prefers_summary() {
        let plans = vec![
            SavingPlan::new(1, "Travel Fund", amt("10"), 3, 2026),
            SavingPlan::new(2, "Other", amt("15"), 3, 2026),
            SavingPlan::new(3, "Other", amt("99"), 4, 2026),
        ];
        let summary = PlanSummary::new(amt("40"), 2);
        assert_eq!(planned_total(Some(&summary), &plans, 3, 2026), dec("40"));
        assert_eq!(planned_total(None, &plans, 3, 2026), dec("25"));
        let zero = PlanSummary::new(Amount::ZERO, 0);
        assert_eq!(planned_total(Some(&zero), &plans, 3, 2026), dec("25"));
        assert_eq!(planned_total(None, &[], 3, 2026), Decimal::ZERO);
    }

    #[test]
    fn test_plan_count() {
        let plans = vec![
            SavingPlan::new(1, "Other", amt("10"), 3, 2026),
            SavingPlan::new(2, "Other", amt("10"), 3, 2026),
        ];
        let active = Filter::new(Period::month(3, 2026), Selector::All);
        let totals = IncomeTotals::compute(&[], &[], &plans, None, &active);
        assert_eq!(totals.plan_count, 2);
        assert_eq!(totals.computed_planned, dec("20"));
        let summary = PlanSummary::new(amt("30"), 3);
        let totals = IncomeTotals::compute(&[], &[], &plans, Some(&summary), &active);
        assert_eq!(totals.plan_count, 3);
        assert_eq!(totals.effective_planned, dec("30"));
        assert_eq!(totals.computed_planned, dec("20"));
    }

    #[test]
    fn test_recent_activity_sort() {
        let act = |id: u64, kind: ActivityKind, date: &str| {
            Activity::new(id, kind, "Other", Amount::ZERO, LedgerDate::parse(date))
        };
        let mut records = vec![
            act(1, ActivityKind::Expense, "2026-01-01"),
            act(2, ActivityKind::Income, "2026-01-03"),
            act(3, ActivityKind::Expense, "2026-01-03"),
            act(4, ActivityKind::Expense, "nope"),
            act(5, ActivityKind::Expense, "2025-12-31"),
        ];
        recent_activity_sort(&mut records);
        let ids: Vec<u64> = records.iter().map(|a| a.id().get()).collect();
        assert_eq!(ids, vec![3, 2, 1, 5, 4]);

        let again = recent_activity_sorted(records.iter().rev());
        let ids_again: Vec<RecordId> = again.iter().map(|a| a.id()).collect();
        let ids: Vec<RecordId> = records.iter().map(|a| a.id()).collect();
        assert_eq!(ids, ids_again);
    }
}
