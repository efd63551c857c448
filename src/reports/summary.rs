//! Spending by category
//!
//! Groups expenses by their denormalized category name. Each group carries a
//! colour key for charting: a fixed table for the well-known category names
//! and a default for everything else.

use crate::models::{Expense, Money, UNCATEGORIZED_NAME};

/// Colour key used for category names not in the table
pub const DEFAULT_COLOR_KEY: &str = "85C1E9";

const COLOR_TABLE: &[(&str, &str)] = &[
    ("Rent", "DDA0DD"),
    ("飲食", "FFEAA7"),
    ("交通", "45B7D1"),
    ("購物", "96CEB4"),
    ("娛樂", "FF6B6B"),
    ("醫療", "4ECDC4"),
    ("其他", "98D8C8"),
    ("未分類", "FF6B6B"),
    (UNCATEGORIZED_NAME, "FF6B6B"),
];

/// Colour key (hex RGB, no `#`) for a category name
pub fn color_key_for(category_name: &str) -> &'static str {
    COLOR_TABLE
        .iter()
        .find(|(name, _)| *name == category_name)
        .map(|(_, key)| *key)
        .unwrap_or(DEFAULT_COLOR_KEY)
}

/// Total spending for one category name
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category_name: String,
    pub total: Money,
    pub color_key: &'static str,
    /// Number of expenses in the group
    pub expense_count: usize,
}

impl CategorySummary {
    /// Share of `overall` spent in this category, in percent
    pub fn percentage_of(&self, overall: Money) -> f64 {
        if overall.is_zero() {
            0.0
        } else {
            (self.total.cents() as f64 / overall.cents() as f64) * 100.0
        }
    }
}

/// Group expenses by category name, largest total first
///
/// Groups with equal totals keep the order in which their first expense
/// was encountered.
pub fn summarize_by_category<'a, I>(expenses: I) -> Vec<CategorySummary>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut summaries: Vec<CategorySummary> = Vec::new();

    for expense in expenses {
        match summaries
            .iter_mut()
            .find(|s| s.category_name == expense.category_name)
        {
            Some(summary) => {
                summary.total += expense.amount;
                summary.expense_count += 1;
            }
            None => summaries.push(CategorySummary {
                category_name: expense.category_name.clone(),
                total: expense.amount,
                color_key: color_key_for(&expense.category_name),
                expense_count: 1,
            }),
        }
    }

    // sort_by is stable, so ties stay in encounter order
    summaries.sort_by(|a, b| b.total.cmp(&a.total));
    summaries
}
