//! Summary and budget display formatting

use super::truncate;
use crate::models::Money;
use crate::reports::CategorySummary;
use crate::services::BudgetStatus;

/// Format per-category spending with each category's share of the total
pub fn format_category_summaries(summaries: &[CategorySummary], currency: &str) -> String {
    if summaries.is_empty() {
        return "No spending this month.\n".to_string();
    }

    let overall: Money = summaries.iter().map(|s| s.total).sum();
    let mut output = String::new();
    output.push_str(&format!(
        "{:20} {:>12} {:>7}  {}\n",
        "Category", "Total", "Share", "Color"
    ));
    output.push_str(&"-".repeat(50));
    output.push('\n');

    for summary in summaries {
        output.push_str(&format!(
            "{:20} {:>12} {:>6.1}%  #{}\n",
            truncate(&summary.category_name, 20),
            summary.total.format_with_symbol(currency),
            summary.percentage_of(overall),
            summary.color_key
        ));
    }

    output
}

/// Format budget against this month's spending
pub fn format_budget_status(status: &BudgetStatus, currency: &str) -> String {
    if status.budget.is_zero() {
        return format!(
            "No budget set. Spent this month: {}\n",
            status.spent.format_with_symbol(currency)
        );
    }

    let mut output = String::new();
    output.push_str(&format!(
        "Budget:    {:>12}\n",
        status.budget.format_with_symbol(currency)
    ));
    output.push_str(&format!(
        "Spent:     {:>12}\n",
        status.spent.format_with_symbol(currency)
    ));
    output.push_str(&format!(
        "Remaining: {:>12}\n",
        status.remaining.format_with_symbol(currency)
    ));
    if let Some(usage) = status.usage {
        output.push_str(&format!("Used:      {:>11.1}%\n", usage * 100.0));
    }
    if status.over_budget {
        output.push_str("Over budget!\n");
    }

    output
}
