//! Expense display formatting
//!
//! Register-style rows: date, category, amount, note, short id.

use super::truncate;
use crate::models::Expense;
use crate::reports::FilteredExpenses;

/// Format a single expense as a register row
pub fn format_expense_row(expense: &Expense, currency: &str, date_format: &str) -> String {
    format!(
        "{:10} {:20} {:>12}  {:24} {}",
        expense.date.format(date_format).to_string(),
        truncate(&expense.category_name, 20),
        expense.amount.format_with_symbol(currency),
        truncate(expense.note_or_empty(), 24),
        expense.id.short()
    )
}

/// Format a filtered expense list with its total
pub fn format_expense_list(result: &FilteredExpenses, currency: &str, date_format: &str) -> String {
    if result.is_empty() {
        return "No expenses found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:10} {:20} {:>12}  {:24} {}\n",
        "Date", "Category", "Amount", "Note", "ID"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for expense in &result.expenses {
        output.push_str(&format_expense_row(expense, currency, date_format));
        output.push('\n');
    }

    output.push_str(&"-".repeat(80));
    output.push('\n');
    output.push_str(&format!(
        "{} expense(s), total {}\n",
        result.len(),
        result.total.format_with_symbol(currency)
    ));

    output
}
