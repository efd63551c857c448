//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod budget;
pub mod category;
pub mod expense;
pub mod export;
pub mod filter;

pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use expense::{handle_add, handle_delete, handle_list, handle_summary, AddArgs};
pub use export::{handle_export_command, ExportArgs};
pub use filter::FilterArgs;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::Money;
use crate::services::Session;
use crate::store::FileStore;

/// Session type the command-line front end works with
pub type CliSession = Session<FileStore>;

/// Parse a user-entered amount
pub(crate) fn parse_amount(input: &str) -> ExpenseResult<Money> {
    Money::parse(input)
        .map_err(|e| ExpenseError::Validation(format!("Invalid amount '{}': {}", input, e)))
}

/// Parse `YYYY-MM-DD`
pub(crate) fn parse_date(input: &str) -> ExpenseResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        ExpenseError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", input))
    })
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]`
///
/// A bare date takes the current local time of day.
pub(crate) fn parse_date_time(input: &str) -> ExpenseResult<NaiveDateTime> {
    let input = input.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(parsed);
        }
    }
    let date = parse_date(input)?;
    let time: NaiveTime = Local::now().time();
    Ok(date.and_time(time))
}
