//! CSV export
//!
//! One row per expense, oldest first:
//!
//! ```text
//! date,category,amount,note
//! 2024-03-01,"Food, Drink",12.50,lunch
//! ```

use std::io::Write;

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::Expense;

/// Header row of the CSV export
pub const CSV_HEADER: &str = "date,category,amount,note";

/// Render expenses as CSV bytes
pub fn to_csv(expenses: &[Expense]) -> Vec<u8> {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + expenses.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for expense in sorted_by_date(expenses) {
        out.push_str(&format!(
            "{},{},{},{}\n",
            expense.date.format("%Y-%m-%d"),
            escape_csv(&expense.category_name),
            expense.amount.to_plain_string(),
            escape_csv(expense.note_or_empty())
        ));
    }

    out.into_bytes()
}

/// Write expenses as CSV to `writer`
pub fn write_expenses_csv<W: Write>(expenses: &[Expense], writer: &mut W) -> ExpenseResult<()> {
    writer
        .write_all(&to_csv(expenses))
        .map_err(|e| ExpenseError::Export(e.to_string()))
}

/// Oldest first; equal dates keep their input order
pub(crate) fn sorted_by_date(expenses: &[Expense]) -> Vec<&Expense> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by_key(|e| e.date);
    sorted
}

/// Escape a string for CSV
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Money, NewExpense};
    use chrono::NaiveDate;

    fn expense(y: i32, m: u32, d: u32, cents: i64, category: &str, note: Option<&str>) -> Expense {
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut input = NewExpense::new(
            Money::from_cents(cents),
            CategoryId::from(category),
            category,
            date,
        );
        if let Some(note) = note {
            input = input.with_note(note);
        }
        Expense::new(input)
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_header_and_ordering() {
        let expenses = vec![
            expense(2024, 3, 2, 500, "Rent", None),
            expense(2024, 3, 1, 1250, "Food", Some("lunch")),
        ];
        let text = String::from_utf8(to_csv(&expenses)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,category,amount,note");
        assert_eq!(lines[1], "2024-03-01,Food,12.50,lunch");
        assert_eq!(lines[2], "2024-03-02,Rent,5.00,");
    }

    #[test]
    fn test_quoted_fields_parse_back() {
        let expenses = vec![expense(2024, 3, 1, 1250, "Food, Drink", Some("a \"quote\""))];
        let bytes = to_csv(&expenses);
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"Food, Drink\""));
        assert!(text.contains("\"a \"\"quote\"\"\""));

        let mut reader = ::csv::Reader::from_reader(bytes.as_slice());
        let records: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][0], "2024-03-01");
        assert_eq!(&records[0][1], "Food, Drink");
        assert_eq!(&records[0][2], "12.50");
        assert_eq!(&records[0][3], "a \"quote\"");
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(to_csv(&[]), b"date,category,amount,note\n".to_vec());
    }

    #[test]
    fn test_write_to_writer() {
        let mut buffer = Vec::new();
        write_expenses_csv(&[expense(2024, 1, 1, 100, "A", None)], &mut buffer).unwrap();
        assert!(String::from_utf8(buffer).unwrap().ends_with("2024-01-01,A,1.00,\n"));
    }
}
