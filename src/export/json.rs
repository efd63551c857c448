//! Structured record export
//!
//! A pretty-printed JSON array, oldest first, with one flat record per
//! expense.

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::csv::sorted_by_date;
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::Expense;

/// One exported expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    /// ISO-8601 local date and time
    pub date: String,
    pub category: String,
    pub amount: f64,
    /// Empty when the expense has no note
    pub note: String,
}

impl From<&Expense> for ExpenseRecord {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id.to_string(),
            date: expense.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            category: expense.category_name.clone(),
            amount: expense.amount.to_major(),
            note: expense.note_or_empty().to_string(),
        }
    }
}

/// Render expenses as a JSON array
pub fn to_structured_records(expenses: &[Expense]) -> ExpenseResult<Vec<u8>> {
    let records: Vec<ExpenseRecord> = sorted_by_date(expenses)
        .into_iter()
        .map(ExpenseRecord::from)
        .collect();
    serde_json::to_vec_pretty(&records).map_err(|e| ExpenseError::Export(e.to_string()))
}

/// Write expenses as a JSON array to `writer`
pub fn write_expenses_json<W: Write>(expenses: &[Expense], writer: &mut W) -> ExpenseResult<()> {
    let bytes = to_structured_records(expenses)?;
    writer
        .write_all(&bytes)
        .map_err(|e| ExpenseError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Money, NewExpense};
    use chrono::NaiveDate;
    use serde_json::Value;

    fn expense(day: u32, cents: i64, note: Option<&str>) -> Expense {
        let date = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let mut input = NewExpense::new(Money::from_cents(cents), CategoryId::from("c"), "Food", date);
        if let Some(note) = note {
            input = input.with_note(note);
        }
        Expense::new(input)
    }

    #[test]
    fn test_records_shape_and_order() {
        let later = expense(5, 999, None);
        let earlier = expense(1, 1250, Some("lunch"));
        let bytes = to_structured_records(&[later.clone(), earlier.clone()]).unwrap();

        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0]["id"], earlier.id.as_str());
        assert_eq!(records[0]["date"], "2024-03-01T08:30:00");
        assert_eq!(records[0]["category"], "Food");
        assert_eq!(records[0]["amount"], 12.5);
        assert_eq!(records[0]["note"], "lunch");

        assert_eq!(records[1]["amount"], 9.99);
        assert_eq!(records[1]["note"], "");
    }

    #[test]
    fn test_records_deserialize() {
        let bytes = to_structured_records(&[expense(2, 100, None)]).unwrap();
        let records: Vec<ExpenseRecord> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(records[0].amount, 1.0);
        assert!(String::from_utf8(bytes).unwrap().contains("\n  "));
    }
}
