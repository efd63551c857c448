//! Reports for the expense tracker
//!
//! Derived, read-only views over a ledger snapshot: the filtered expense
//! list with its total, and per-category spending summaries.

pub mod filter;
pub mod summary;

pub use filter::{apply, apply_at, DatePreset, DateRange, FilterState, FilteredExpenses};
pub use summary::{color_key_for, summarize_by_category, CategorySummary, DEFAULT_COLOR_KEY};
