use clap::Parser;
use mm_tracker::args::{Args, Command, ExpenseAction, IncomeAction, PlanAction};
use mm_tracker::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().mmt_home().path();

    // This allows for running the program without a record store. When MMT_IN_TEST_MODE is set
    // and non-zero in length, then the mode will be Mode::Memory, otherwise Mode::Http.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Auth(auth_args) => {
            let config = Config::load(home).await?;
            match auth_args.token() {
                Some(token) => commands::auth(&config, token).await?.print(),
                None => commands::auth_clear(&config).await?.print(),
            }
        }

        Command::Expenses(expenses_args) => {
            let config = Config::load(home).await?;
            match expenses_args.action() {
                ExpenseAction::List(a) => commands::list_expenses(config, mode, a).await?.print(),
                ExpenseAction::Add(a) => commands::add_expense(config, mode, a).await?.print(),
                ExpenseAction::Delete(a) => {
                    commands::delete_expenses(config, mode, a).await?.print()
                }
            }
        }

        Command::Incomes(incomes_args) => {
            let config = Config::load(home).await?;
            match incomes_args.action() {
                IncomeAction::List(a) => commands::list_incomes(config, mode, a).await?.print(),
                IncomeAction::Add(a) => commands::add_income(config, mode, a).await?.print(),
                IncomeAction::Delete(a) => commands::delete_incomes(config, mode, a).await?.print(),
            }
        }

        Command::Plans(plans_args) => {
            let config = Config::load(home).await?;
            match plans_args.action() {
                PlanAction::List(a) => commands::list_plans(config, mode, a).await?.print(),
                PlanAction::Add(a) => commands::add_plan(config, mode, a).await?.print(),
                PlanAction::Delete(a) => commands::delete_plans(config, mode, a).await?.print(),
            }
        }

        Command::Summary(summary_args) => {
            let config = Config::load(home).await?;
            commands::summary(config, mode, summary_args).await?.print()
        }

        Command::Activity(activity_args) => {
            let config = Config::load(home).await?;
            commands::activity(config, mode, activity_args)
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                "mm_tracker",
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
