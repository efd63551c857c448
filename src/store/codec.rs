//! Record encoding and decoding
//!
//! Documents use camelCase field names. Expense records have been written
//! under several schemas over time, so [`decode_expense`] resolves the
//! category reference through a fallback chain and reports which path it
//! took:
//!
//! 1. `categoryId` + `categoryName` (current schema)
//! 2. a bare `category` string, used as both id and name
//! 3. a `categoryName` string on its own, used as both id and name
//! 4. the "uncategorized" sentinel
//!
//! Every place that reads expense documents goes through this module.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{json, Value};
use std::fmt;

use super::{Document, DocumentSnapshot};
use crate::models::{
    Budget, Category, CategoryId, Expense, ExpenseId, Money, UNCATEGORIZED_NAME,
};

/// Which legacy schema an expense record was written under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyFormat {
    /// Only a `category` string
    BareCategory,
    /// Only a `categoryName` string
    CategoryNameOnly,
    /// No category information at all
    Missing,
}

/// Why a document could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub doc_id: String,
    pub reason: String,
}

impl DecodeError {
    fn new(doc_id: &str, reason: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.doc_id, self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// Outcome of decoding one expense document
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedExpense {
    /// Current schema
    Decoded(Expense),
    /// Decoded through a legacy fallback
    LegacyDecoded {
        expense: Expense,
        format: LegacyFormat,
    },
    /// Not a usable expense record
    Unparseable(DecodeError),
}

impl DecodedExpense {
    /// The expense, whichever schema it came from
    pub fn into_expense(self) -> Option<Expense> {
        match self {
            Self::Decoded(expense) | Self::LegacyDecoded { expense, .. } => Some(expense),
            Self::Unparseable(_) => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::LegacyDecoded { .. })
    }
}

fn non_empty_str<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse a stored timestamp into local wall-clock time
///
/// Accepts naive ISO-8601 strings, RFC 3339 strings, bare `YYYY-MM-DD`
/// dates, and `{ "seconds": .., "nanos": .. }` timestamp objects.
pub fn decode_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(naive) = s.parse::<NaiveDateTime>() {
                return Some(naive);
            }
            if let Ok(zoned) = DateTime::parse_from_rfc3339(s) {
                return Some(zoned.with_timezone(&Local).naive_local());
            }
            s.parse::<NaiveDate>()
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        }
        Value::Object(obj) => {
            let seconds = obj.get("seconds").and_then(Value::as_i64)?;
            let nanos = obj
                .get("nanos")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::<Utc>::from_timestamp(seconds, nanos)
                .map(|utc| utc.with_timezone(&Local).naive_local())
        }
        _ => None,
    }
}

fn decode_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        Value::Object(obj) => {
            let seconds = obj.get("seconds").and_then(Value::as_i64)?;
            let nanos = obj
                .get("nanos")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::<Utc>::from_timestamp(seconds, nanos)
        }
        _ => None,
    }
}

fn decode_amount(value: Option<&Value>) -> Option<Money> {
    value.and_then(Value::as_f64).and_then(Money::from_major)
}

/// Resolve the category reference of an expense record
pub fn resolve_category(doc: &Document) -> (CategoryId, String, Option<LegacyFormat>) {
    if let (Some(id), Some(name)) = (
        non_empty_str(doc, "categoryId"),
        non_empty_str(doc, "categoryName"),
    ) {
        return (CategoryId::from(id), name.to_string(), None);
    }
    if let Some(bare) = non_empty_str(doc, "category") {
        return (
            CategoryId::from(bare),
            bare.to_string(),
            Some(LegacyFormat::BareCategory),
        );
    }
    if let Some(name) = non_empty_str(doc, "categoryName") {
        return (
            CategoryId::from(name),
            name.to_string(),
            Some(LegacyFormat::CategoryNameOnly),
        );
    }
    (
        CategoryId::uncategorized(),
        UNCATEGORIZED_NAME.to_string(),
        Some(LegacyFormat::Missing),
    )
}

/// Decode an expense document
pub fn decode_expense(doc_id: &str, doc: &Document) -> DecodedExpense {
    let id = non_empty_str(doc, "id").unwrap_or(doc_id);
    if id.trim().is_empty() {
        return DecodedExpense::Unparseable(DecodeError::new(doc_id, "missing id"));
    }

    let amount = match decode_amount(doc.get("amount")) {
        Some(amount) if !amount.is_negative() => amount,
        Some(amount) => {
            return DecodedExpense::Unparseable(DecodeError::new(
                doc_id,
                format!("negative amount {}", amount),
            ))
        }
        None => {
            return DecodedExpense::Unparseable(DecodeError::new(doc_id, "missing or invalid amount"))
        }
    };

    let Some(date) = doc.get("date").and_then(decode_datetime) else {
        return DecodedExpense::Unparseable(DecodeError::new(doc_id, "missing or invalid date"));
    };

    let (category_id, category_name, legacy) = resolve_category(doc);
    let expense = Expense {
        id: ExpenseId::from(id),
        amount,
        category_id,
        category_name,
        date,
        note: non_empty_str(doc, "note").map(str::to_string),
    };

    match legacy {
        None => DecodedExpense::Decoded(expense),
        Some(format) => DecodedExpense::LegacyDecoded { expense, format },
    }
}

/// Decode every expense in a snapshot, collecting the ids that failed
pub fn decode_expenses(documents: &DocumentSnapshot) -> (Vec<Expense>, Vec<DecodeError>) {
    let mut expenses = Vec::with_capacity(documents.len());
    let mut failures = Vec::new();
    for (doc_id, doc) in documents {
        match decode_expense(doc_id, doc) {
            DecodedExpense::Decoded(expense) | DecodedExpense::LegacyDecoded { expense, .. } => {
                expenses.push(expense)
            }
            DecodedExpense::Unparseable(err) => failures.push(err),
        }
    }
    (expenses, failures)
}

/// Encode an expense in the current schema
pub fn encode_expense(expense: &Expense) -> Document {
    let mut doc = Document::new();
    doc.insert("id".into(), json!(expense.id.as_str()));
    doc.insert("amount".into(), json!(expense.amount.to_major()));
    doc.insert("categoryId".into(), json!(expense.category_id.as_str()));
    doc.insert("categoryName".into(), json!(expense.category_name));
    doc.insert(
        "date".into(),
        json!(expense.date.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
    );
    if let Some(note) = &expense.note {
        doc.insert("note".into(), json!(note));
    }
    doc
}

/// Decode a category document; `id`, `name` and `createdAt` are required
pub fn decode_category(doc_id: &str, doc: &Document) -> Result<Category, DecodeError> {
    let id = non_empty_str(doc, "id").ok_or_else(|| DecodeError::new(doc_id, "missing id"))?;
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::new(doc_id, "missing name"))?;
    let created_at = doc
        .get("createdAt")
        .and_then(decode_utc)
        .ok_or_else(|| DecodeError::new(doc_id, "missing or invalid createdAt"))?;

    Ok(Category {
        id: CategoryId::from(id),
        name: name.to_string(),
        created_at,
    })
}

/// Encode a category
pub fn encode_category(category: &Category) -> Document {
    let mut doc = Document::new();
    doc.insert("id".into(), json!(category.id.as_str()));
    doc.insert("name".into(), json!(category.name));
    doc.insert("createdAt".into(), json!(category.created_at.to_rfc3339()));
    doc
}

/// Decode the budget document
///
/// A missing document, missing amount, or unusable amount all read as an
/// unset budget.
pub fn decode_budget(doc: Option<&Document>) -> Budget {
    let Some(doc) = doc else {
        return Budget::unset();
    };
    let amount = decode_amount(doc.get("amount"))
        .filter(|a| !a.is_negative())
        .unwrap_or_default();
    Budget {
        amount,
        updated_at: doc.get("updatedAt").and_then(decode_utc),
    }
}

/// Encode the budget document
pub fn encode_budget(budget: &Budget) -> Document {
    let mut doc = Document::new();
    doc.insert("amount".into(), json!(budget.amount.to_major()));
    if let Some(updated_at) = budget.updated_at {
        doc.insert("updatedAt".into(), json!(updated_at.to_rfc3339()));
    }
    doc
}
