//! Selection of records by period and by category or source.
//!
//! Every function here borrows the full record set and returns a lazy view over it. Nothing is
//! copied or mutated, so calling a filter twice with the same arguments always yields the same
//! sequence in the same order.

use crate::model::{LedgerDate, Record, SavingPlan};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const ALL: &str = "all";

/// A calendar month, optionally narrowed to a single day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub day: Option<u32>,
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn month(month: u32, year: i32) -> Self {
        Self {
            day: None,
            month,
            year,
        }
    }

    pub fn day(day: u32, month: u32, year: i32) -> Self {
        Self {
            day: Some(day),
            month,
            year,
        }
    }

    /// Whether `date` falls inside this period. A date that could not be parsed is never inside
    /// any period.
    pub fn contains(&self, date: &LedgerDate) -> bool {
        let Some(d) = date.date() else {
            return false;
        };
        let same_month = d.month() == self.month && d.year() == self.year;
        match self.day {
            None => same_month,
            Some(day) => same_month && d.day() == day,
        }
    }
}

/// Which category (or source) to keep. `all` keeps everything.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == label,
        }
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == ALL {
            Selector::All
        } else {
            Selector::Only(s.to_string())
        })
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::All => f.write_str(ALL),
            Selector::Only(s) => f.write_str(s),
        }
    }
}

/// The active period together with the category/source selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub period: Period,
    pub selector: Selector,
}

impl Filter {
    pub fn new(period: Period, selector: Selector) -> Self {
        Self { period, selector }
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.period.contains(record.date()) && self.selector.matches(record.label())
    }
}

/// Returns the records that fall in `filter.period` and match `filter.selector`, in their
/// original order. The returned iterator can be cloned to walk the selection again.
pub fn filter<'a, R>(
    records: &'a [R],
    filter: &'a Filter,
) -> impl Iterator<Item = &'a R> + Clone + 'a
where
    R: Record,
{
    records.iter().filter(move |r| filter.matches(*r))
}

/// Records whose date falls anywhere in `year`.
pub fn in_year<R>(records: &[R], year: i32) -> impl Iterator<Item = &R> + Clone
where
    R: Record,
{
    records.iter().filter(move |r| r.date().year() == Some(year))
}

/// Plans carry no date, so they are selected by their (month, year).
pub fn plans_for(
    plans: &[SavingPlan],
    month: u32,
    year: i32,
) -> impl Iterator<Item = &SavingPlan> + Clone {
    plans.iter().filter(move |p| p.is_for(month, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Expense, ExpenseType, Income, RecordId};

    fn expense(id: u64, category: &str, date: &str) -> Expense {
        Expense::new(
            id,
            category,
            Amount::from_f64(10.0).unwrap(),
            LedgerDate::parse(date),
            ExpenseType::Regular,
        )
    }

    fn ids<'a>(it: impl Iterator<Item = &'a Expense>) -> Vec<RecordId> {
        it.map(|e| e.id()).collect()
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense(1, "Rent", "2026-01-05"),
            expense(2, "Dining", "2026-01-10"),
            expense(3, "Rent", "2026-02-05"),
            expense(4, "Rent", "2025-01-05"),
            expense(5, "Dining", "garbage"),
            expense(6, "Rent", "2026-01-05T08:00:00"),
        ]
    }

    #[test]
    fn test_month_period() {
        let records = sample();
        let f = Filter::new(Period::month(1, 2026), Selector::All);
        assert_eq!(
            ids(filter(&records, &f)),
            vec![RecordId::new(1), RecordId::new(2), RecordId::new(6)]
        );
    }

    #[test]
    fn test_day_period() {
        let records = sample();
        let f = Filter::new(Period::day(5, 1, 2026), Selector::All);
        assert_eq!(
            ids(filter(&records, &f)),
            vec![RecordId::new(1), RecordId::new(6)]
        );
    }

    #[test]
    fn test_selector() {
        let records = sample();
        let f = Filter::new(Period::month(1, 2026), "Dining".parse().unwrap());
        assert_eq!(ids(filter(&records, &f)), vec![RecordId::new(2)]);
        let f = Filter::new(Period::month(1, 2026), "dining".parse().unwrap());
        assert!(filter(&records, &f).next().is_none());
    }

    #[test]
    fn test_all_parses() {
        assert_eq!("all".parse::<Selector>().unwrap(), Selector::All);
        assert_eq!(Selector::All.to_string(), "all");
    }

    #[test]
    fn test_unparsable_dates_never_match() {
        let records = vec![expense(9, "Dining", "garbage"), expense(10, "Dining", "")];
        for month in 1..=12 {
            let f = Filter::new(Period::month(month, 2026), Selector::All);
            assert_eq!(filter(&records, &f).count(), 0);
        }
        assert_eq!(in_year(&records, 2026).count(), 0);
    }

    #[test]
    fn test_filter_is_restartable_and_repeatable() {
        let records = sample();
        let f = Filter::new(Period::month(1, 2026), Selector::All);
        let view = filter(&records, &f);
        let first = ids(view.clone());
        let second = ids(view);
        assert_eq!(first, second);
        assert_eq!(first, ids(filter(&records, &f)));
        assert_eq!(records.len(), 6);
    }

    #[test]
    fn test_in_year() {
        let records = sample();
        assert_eq!(in_year(&records, 2026).count(), 4);
        assert_eq!(in_year(&records, 2025).count(), 1);
    }

    #[test]
    fn test_incomes_use_source() {
        let incomes = vec![
            Income::new(1, "Salary", Amount::ZERO, LedgerDate::parse("2026-03-01")),
            Income::new(2, "Gift", Amount::ZERO, LedgerDate::parse("2026-03-02")),
        ];
        let f = Filter::new(Period::month(3, 2026), "Gift".parse().unwrap());
        let found: Vec<_> = filter(&incomes, &f).map(|i| i.id()).collect();
        assert_eq!(found, vec![RecordId::new(2)]);
    }

    #[test]
    fn test_plans_for() {
        let plans = vec![
            SavingPlan::new(1, "Travel Fund", Amount::ZERO, 3, 2026),
            SavingPlan::new(2, "Travel Fund", Amount::ZERO, 3, 2026),
            SavingPlan::new(3, "Other", Amount::ZERO, 4, 2026),
        ];
        assert_eq!(plans_for(&plans, 3, 2026).count(), 2);
        assert_eq!(plans_for(&plans, 3, 2025).count(), 0);
    }
}
