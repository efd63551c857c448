//! Display formatting for terminal output
//!
//! Plain-text tables for expenses, categories, summaries and the budget.
//! Every formatter returns a `String`; printing is left to the caller.

pub mod category;
pub mod expense;
pub mod report;

pub use category::format_category_list;
pub use expense::{format_expense_list, format_expense_row};
pub use report::{format_budget_status, format_category_summaries};

/// Shorten `s` to at most `max` characters, marking the cut with `…`
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
