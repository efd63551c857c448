//! Export module for the expense tracker
//!
//! Turns a list of expenses into bytes for an external file or share sheet:
//! - CSV: spreadsheet-compatible rows
//! - JSON: structured records

pub mod csv;
pub mod json;

pub use self::csv::{to_csv, write_expenses_csv, CSV_HEADER};
pub use self::json::{to_structured_records, write_expenses_json, ExpenseRecord};

use std::fmt;

use crate::error::ExpenseResult;
use crate::models::Expense;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse a format name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Default file name for an export in this format
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Csv => "expenses.csv",
            Self::Json => "expenses.json",
        }
    }

    /// Render `expenses` in this format
    pub fn render(&self, expenses: &[Expense]) -> ExpenseResult<Vec<u8>> {
        match self {
            Self::Csv => Ok(to_csv(expenses)),
            Self::Json => to_structured_records(expenses),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Json => write!(f, "JSON"),
        }
    }
}
