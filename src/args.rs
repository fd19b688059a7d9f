//! These structs provide the CLI interface for the mmt CLI.

use crate::filter::{Period, Selector};
use crate::model::{ExpenseType, RecordId};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// mmt: A command-line client for the M&M personal finance tracker.
///
/// Record your incomes, expenses and monthly saving plans in an M&M record store and see how
/// much you have spent, earned and put aside for any month or day.
///
/// Run `mmt init` once to create the home directory, then `mmt auth --token <TOKEN>` to save the
/// token issued by the store. When MMT_IN_TEST_MODE is set, a local in-memory store is used
/// instead of the server.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and its configuration file.
    ///
    /// This is the first command you should run. By default the home directory is $HOME/mmt;
    /// pass --mmt-home or set MMT_HOME to put it somewhere else.
    Init(InitArgs),
    /// Save or remove the token used to talk to the record store.
    Auth(AuthArgs),
    /// List, add or delete expenses.
    Expenses(ExpensesArgs),
    /// List, add or delete incomes.
    Incomes(IncomesArgs),
    /// List, add or delete the saving plans of a month.
    Plans(PlansArgs),
    /// Show the expense and income totals of a period.
    Summary(SummaryArgs),
    /// Run the recent-activity feed for a number of steps, printing its order at each step.
    Activity(ActivityArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where mmt configuration and the token are held. Defaults to ~/mmt
    #[arg(long, env = "MMT_HOME", default_value_t = default_mmt_home())]
    mmt_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, mmt_home: PathBuf) -> Self {
        Self {
            log_level,
            mmt_home: mmt_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn mmt_home(&self) -> &DisplayPath {
        &self.mmt_home
    }
}

/// (Not shown): Args for the `mmt init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the record store, e.g. https://mm.example.com/api. Defaults to
    /// http://localhost:8000/
    #[arg(long)]
    api_url: Option<String>,
}

impl InitArgs {
    pub fn new(api_url: Option<String>) -> Self {
        Self { api_url }
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }
}

/// (Not shown): Args for the `mmt auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// The token issued by the record store. It is saved to the token file.
    #[arg(long, conflicts_with = "clear", required_unless_present = "clear")]
    token: Option<String>,

    /// Remove the saved token.
    #[arg(long)]
    clear: bool,
}

impl AuthArgs {
    pub fn new(token: Option<String>, clear: bool) -> Self {
        Self { token, clear }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn clear(&self) -> bool {
        self.clear
    }
}

/// The period to show. Anything left out is taken from today's date, except the day: without
/// --day the whole month is shown.
#[derive(Debug, Parser, Clone, Default)]
pub struct PeriodArgs {
    /// The month, 1 to 12. Defaults to the current month.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// The year. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,

    /// Narrow the period to one day of the month.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    day: Option<u32>,
}

impl PeriodArgs {
    pub fn new(month: Option<u32>, year: Option<i32>, day: Option<u32>) -> Self {
        Self { month, year, day }
    }

    pub fn period(&self) -> Period {
        let today = Local::now().date_naive();
        let month = self.month.unwrap_or_else(|| today.month());
        let year = self.year.unwrap_or_else(|| today.year());
        match self.day {
            Some(day) => Period::day(day, month, year),
            None => Period::month(month, year),
        }
    }
}

/// (Not shown): Args for the `mmt expenses` command.
#[derive(Debug, Parser, Clone)]
pub struct ExpensesArgs {
    #[command(subcommand)]
    action: ExpenseAction,
}

impl ExpensesArgs {
    pub fn new(action: ExpenseAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &ExpenseAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseAction {
    /// Show the regular and additional expenses of a period with their totals.
    List(ExpenseListArgs),
    /// Record a new expense.
    Add(ExpenseAddArgs),
    /// Delete expenses by id.
    Delete(DeleteArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ExpenseListArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Only show this category, or `all`.
    #[arg(long, default_value_t = Selector::All)]
    category: Selector,
}

impl ExpenseListArgs {
    pub fn new(period: PeriodArgs, category: Selector) -> Self {
        Self { period, category }
    }

    pub fn period(&self) -> Period {
        self.period.period()
    }

    pub fn category(&self) -> &Selector {
        &self.category
    }
}

/// The two expense types a new expense can have.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExpenseTypeArg {
    Regular,
    #[default]
    Additional,
}

impl From<ExpenseTypeArg> for ExpenseType {
    fn from(value: ExpenseTypeArg) -> Self {
        match value {
            ExpenseTypeArg::Regular => ExpenseType::Regular,
            ExpenseTypeArg::Additional => ExpenseType::Additional,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ExpenseAddArgs {
    /// One of the expense categories, e.g. Groceries.
    #[arg(long)]
    category: String,

    /// The amount, e.g. 12.50
    #[arg(long)]
    amount: String,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long, default_value = "")]
    notes: String,

    /// Regular expenses recur every month, additional ones happen once.
    #[arg(long = "type", value_enum, default_value_t = ExpenseTypeArg::Additional)]
    expense_type: ExpenseTypeArg,
}

impl ExpenseAddArgs {
    pub fn new(
        category: impl Into<String>,
        amount: impl Into<String>,
        date: Option<String>,
        expense_type: ExpenseTypeArg,
    ) -> Self {
        Self {
            category: category.into(),
            amount: amount.into(),
            date,
            notes: String::new(),
            expense_type,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn date(&self) -> String {
        date_or_today(self.date.as_deref())
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn expense_type(&self) -> ExpenseType {
        self.expense_type.into()
    }
}

/// Args shared by the `delete` subcommands.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ids to delete. Deletion continues past ids that fail.
    #[arg(required = true, num_args = 1..)]
    ids: Vec<RecordId>,
}

impl DeleteArgs {
    pub fn new(ids: Vec<RecordId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }
}

/// (Not shown): Args for the `mmt incomes` command.
#[derive(Debug, Parser, Clone)]
pub struct IncomesArgs {
    #[command(subcommand)]
    action: IncomeAction,
}

impl IncomesArgs {
    pub fn new(action: IncomeAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &IncomeAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum IncomeAction {
    /// Show the incomes of a period with the income totals.
    List(IncomeListArgs),
    /// Record a new income.
    Add(IncomeAddArgs),
    /// Delete incomes by id.
    Delete(DeleteArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct IncomeListArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Only show this source, or `all`.
    #[arg(long, default_value_t = Selector::All)]
    source: Selector,
}

impl IncomeListArgs {
    pub fn new(period: PeriodArgs, source: Selector) -> Self {
        Self { period, source }
    }

    pub fn period(&self) -> Period {
        self.period.period()
    }

    pub fn source(&self) -> &Selector {
        &self.source
    }
}

#[derive(Debug, Parser, Clone)]
pub struct IncomeAddArgs {
    /// One of the income sources, e.g. Salary.
    #[arg(long)]
    source: String,

    /// The amount, e.g. 4200
    #[arg(long)]
    amount: String,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long, default_value = "")]
    notes: String,
}

impl IncomeAddArgs {
    pub fn new(source: impl Into<String>, amount: impl Into<String>, date: Option<String>) -> Self {
        Self {
            source: source.into(),
            amount: amount.into(),
            date,
            notes: String::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn date(&self) -> String {
        date_or_today(self.date.as_deref())
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

/// (Not shown): Args for the `mmt plans` command.
#[derive(Debug, Parser, Clone)]
pub struct PlansArgs {
    #[command(subcommand)]
    action: PlanAction,
}

impl PlansArgs {
    pub fn new(action: PlanAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &PlanAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlanAction {
    /// Show the saving plans of a month and their total.
    List(PlanListArgs),
    /// Add a saving plan to a month.
    Add(PlanAddArgs),
    /// Delete saving plans by id.
    Delete(DeleteArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct PlanListArgs {
    #[clap(flatten)]
    period: PeriodArgs,
}

impl PlanListArgs {
    pub fn new(period: PeriodArgs) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Period {
        self.period.period()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct PlanAddArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// One of the saving categories, e.g. "Emergency Fund".
    #[arg(long)]
    category: String,

    /// The amount to put aside, e.g. 250
    #[arg(long)]
    amount: String,
}

impl PlanAddArgs {
    pub fn new(period: PeriodArgs, category: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            period,
            category: category.into(),
            amount: amount.into(),
        }
    }

    pub fn period(&self) -> Period {
        self.period.period()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// (Not shown): Args for the `mmt summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Only count this expense category, or `all`.
    #[arg(long, default_value_t = Selector::All)]
    category: Selector,

    /// Only count this income source, or `all`.
    #[arg(long, default_value_t = Selector::All)]
    source: Selector,
}

impl SummaryArgs {
    pub fn new(period: PeriodArgs, category: Selector, source: Selector) -> Self {
        Self {
            period,
            category,
            source,
        }
    }

    pub fn period(&self) -> Period {
        self.period.period()
    }

    pub fn category(&self) -> &Selector {
        &self.category
    }

    pub fn source(&self) -> &Selector {
        &self.source
    }
}

/// (Not shown): Args for the `mmt activity` command.
#[derive(Debug, Parser, Clone)]
pub struct ActivityArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// How many cycle steps to run before exiting.
    #[arg(long, default_value_t = 4)]
    ticks: u32,

    /// Hold the feed still, as a pointer hovering over it would, after this many steps.
    #[arg(long)]
    hover_at: Option<u32>,
}

impl ActivityArgs {
    pub fn new(period: PeriodArgs, ticks: u32, hover_at: Option<u32>) -> Self {
        Self {
            period,
            ticks,
            hover_at,
        }
    }

    pub fn period(&self) -> Period {
        self.period.period()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn hover_at(&self) -> Option<u32> {
        self.hover_at
    }
}

fn date_or_today(date: Option<&str>) -> String {
    match date {
        Some(d) => d.to_string(),
        None => Local::now().date_naive().format("%Y-%m-%d").to_string(),
    }
}

fn default_mmt_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("mmt"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --mmt-home or MMT_HOME instead of relying on the default \
                mmt home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("mmt")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
