//! A client for the M&M personal finance tracker.
//!
//! The crate fetches incomes, expenses and monthly saving plans from a record store, filters and
//! totals them per period, and drives the cycling recent-activity list. `Tracker` owns the state
//! of one session; the `commands` module renders it for the `mmt` CLI.

pub mod activity;
pub mod aggregate;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod feed;
pub mod filter;
pub mod format;
pub mod model;
pub mod session;
pub mod tracker;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{error_type, Error, ErrorType, Result};
pub use tracker::Tracker;
