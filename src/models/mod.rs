//! Core data models for the expense tracker
//!
//! This module contains the data structures that represent the domain:
//! expenses, categories, the monthly budget, and the money and period types
//! they are built on.

pub mod budget;
pub mod category;
pub mod expense;
pub mod ids;
pub mod money;
pub mod period;

pub use budget::Budget;
pub use category::{Category, CategoryValidationError};
pub use expense::{Expense, ExpenseValidationError, NewExpense};
pub use ids::{CategoryId, ExpenseId, UserId, UNCATEGORIZED_ID, UNCATEGORIZED_NAME};
pub use money::Money;
pub use period::MonthPeriod;
