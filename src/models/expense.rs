//! Expense model
//!
//! An expense is a single spending record. It references its category by id
//! and carries a denormalized copy of the category name, taken at write time,
//! so that listings and summaries never need a live category lookup.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, ExpenseId};
use super::money::Money;

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier, immutable after creation
    pub id: ExpenseId,

    /// Amount spent (never negative)
    pub amount: Money,

    /// Referenced category
    pub category_id: CategoryId,

    /// Category name as of the last write or rename propagation
    pub category_name: String,

    /// When the expense happened (local wall-clock time)
    pub date: NaiveDateTime,

    /// Optional free-text annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Expense {
    /// Build an expense with a fresh id from user input
    pub fn new(input: NewExpense) -> Self {
        Self {
            id: ExpenseId::new(),
            amount: input.amount,
            category_id: input.category_id,
            category_name: input.category_name,
            date: input.date,
            note: input.note.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Check whether the expense falls in the given calendar month
    pub fn is_in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }

    /// The note, or an empty string when absent
    pub fn note_or_empty(&self) -> &str {
        self.note.as_deref().unwrap_or("")
    }

    /// Validate the expense
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.amount.is_negative() {
            return Err(ExpenseValidationError::NegativeAmount(self.amount));
        }
        Ok(())
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.category_name,
            self.amount
        )
    }
}

/// User input for a new expense, before an id is assigned
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Money,
    pub category_id: CategoryId,
    pub category_name: String,
    pub date: NaiveDateTime,
    pub note: Option<String>,
}

impl NewExpense {
    /// Create input with no note
    pub fn new(
        amount: Money,
        category_id: CategoryId,
        category_name: impl Into<String>,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            amount,
            category_id,
            category_name: category_name.into(),
            date,
            note: None,
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Validate user input; amounts must be strictly positive
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if !self.amount.is_positive() {
            return Err(ExpenseValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

/// Validation errors for expenses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    NegativeAmount(Money),
    NonPositiveAmount(Money),
}

impl fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount(amount) => {
                write!(f, "Expense amount cannot be negative ({})", amount)
            }
            Self::NonPositiveAmount(amount) => {
                write!(f, "Expense amount must be greater than zero ({})", amount)
            }
        }
    }
}

impl std::error::Error for ExpenseValidationError {}
