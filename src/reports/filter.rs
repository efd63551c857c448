//! Expense filtering
//!
//! A [`FilterState`] combines a date preset with an optional set of
//! categories. Preset months are half-open ranges; a custom range runs from
//! the start of its first day through the last instant of its last day.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{CategoryId, Expense, Money, MonthPeriod};

/// Date restriction of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    #[default]
    All,
    ThisMonth,
    LastMonth,
    Custom,
}

impl DatePreset {
    /// Parse a preset from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "all" => Some(Self::All),
            "this-month" | "thismonth" | "month" => Some(Self::ThisMonth),
            "last-month" | "lastmonth" => Some(Self::LastMonth),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::ThisMonth => write!(f, "This month"),
            Self::LastMonth => write!(f, "Last month"),
            Self::Custom => write!(f, "Custom"),
        }
    }
}

/// A resolved date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Whether `end` itself is inside the range
    pub end_inclusive: bool,
}

impl DateRange {
    /// Half-open range covering one calendar month
    pub fn month(period: MonthPeriod) -> Self {
        Self {
            start: period.start(),
            end: period.end_exclusive(),
            end_inclusive: false,
        }
    }

    /// Closed range from the start of `from` through the end of `to`
    pub fn days(from: NaiveDate, to: NaiveDate) -> Self {
        let last_instant = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap_or(NaiveTime::MIN);
        Self {
            start: from.and_time(NaiveTime::MIN),
            end: to.and_time(last_instant),
            end_inclusive: true,
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        if at < self.start {
            return false;
        }
        if self.end_inclusive {
            at <= self.end
        } else {
            at < self.end
        }
    }
}

/// Filter selections for the expense list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub preset: DatePreset,
    /// Only used with [`DatePreset::Custom`]
    pub start_date: NaiveDate,
    /// Only used with [`DatePreset::Custom`]
    pub end_date: NaiveDate,
    /// Empty means every category
    pub selected_category_ids: BTreeSet<CategoryId>,
}

impl Default for FilterState {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            preset: DatePreset::All,
            start_date: today,
            end_date: today,
            selected_category_ids: BTreeSet::new(),
        }
    }
}

impl FilterState {
    /// A filter with only a preset
    pub fn preset(preset: DatePreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// A custom date range filter
    pub fn custom(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            preset: DatePreset::Custom,
            start_date,
            end_date,
            selected_category_ids: BTreeSet::new(),
        }
    }

    /// Restrict to the given categories
    pub fn with_categories<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = CategoryId>,
    {
        self.selected_category_ids.extend(ids);
        self
    }

    /// Date range the preset resolves to as of `now`; `None` for `All`
    pub fn effective_date_range(&self, now: NaiveDateTime) -> Option<DateRange> {
        let this_month = MonthPeriod::containing(now);
        match self.preset {
            DatePreset::All => None,
            DatePreset::ThisMonth => Some(DateRange::month(this_month)),
            DatePreset::LastMonth => Some(DateRange::month(this_month.prev())),
            DatePreset::Custom => Some(DateRange::days(self.start_date, self.end_date)),
        }
    }

    fn matches_category(&self, expense: &Expense) -> bool {
        self.selected_category_ids.is_empty()
            || self.selected_category_ids.contains(&expense.category_id)
    }

    /// Whether anything narrows the result
    pub fn is_active(&self) -> bool {
        self.preset != DatePreset::All || !self.selected_category_ids.is_empty()
    }
}

/// Expenses that passed a filter, newest first, with their total
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredExpenses {
    pub expenses: Vec<Expense>,
    pub total: Money,
}

impl FilteredExpenses {
    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

/// Apply a filter as of the current local time
pub fn apply(expenses: &[Expense], filter: &FilterState) -> FilteredExpenses {
    apply_at(expenses, filter, Local::now().naive_local())
}

/// Apply a filter as of `now`
///
/// A custom range whose start is after its end matches nothing.
pub fn apply_at(expenses: &[Expense], filter: &FilterState, now: NaiveDateTime) -> FilteredExpenses {
    let range = filter.effective_date_range(now);

    let mut matched: Vec<Expense> = expenses
        .iter()
        .filter(|e| range.map_or(true, |r| r.contains(e.date)))
        .filter(|e| filter.matches_category(e))
        .cloned()
        .collect();

    matched.sort_by(|a, b| b.date.cmp(&a.date));
    let total = matched.iter().map(|e| e.amount).sum();

    FilteredExpenses {
        expenses: matched,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewExpense;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(cents: i64, cat: &str, date: NaiveDateTime) -> Expense {
        Expense::new(NewExpense::new(
            Money::from_cents(cents),
            CategoryId::from(cat),
            cat,
            date,
        ))
    }

    fn dates(result: &FilteredExpenses) -> Vec<NaiveDateTime> {
        result.expenses.iter().map(|e| e.date).collect()
    }

    #[test]
    fn test_all_passes_everything_newest_first() {
        let expenses = vec![
            expense(100, "a", at(2023, 1, 1, 0, 0, 0)),
            expense(200, "b", at(2024, 6, 1, 0, 0, 0)),
        ];
        let result = apply_at(&expenses, &FilterState::preset(DatePreset::All), at(2024, 1, 1, 0, 0, 0));
        assert_eq!(
            dates(&result),
            vec![at(2024, 6, 1, 0, 0, 0), at(2023, 1, 1, 0, 0, 0)]
        );
        assert_eq!(result.total, Money::from_cents(300));
    }

    #[test]
    fn test_this_month_is_end_exclusive() {
        let expenses = vec![
            expense(100, "a", at(2024, 1, 31, 23, 59, 59)),
            expense(200, "a", at(2024, 2, 1, 0, 0, 0)),
        ];
        let now = at(2024, 1, 15, 12, 0, 0);
        let result = apply_at(&expenses, &FilterState::preset(DatePreset::ThisMonth), now);
        assert_eq!(dates(&result), vec![at(2024, 1, 31, 23, 59, 59)]);
        assert_eq!(result.total, Money::from_cents(100));
    }

    #[test]
    fn test_last_month_crosses_year() {
        let expenses = vec![
            expense(100, "a", at(2023, 12, 1, 0, 0, 0)),
            expense(200, "a", at(2024, 1, 1, 0, 0, 0)),
            expense(300, "a", at(2023, 11, 30, 23, 59, 59)),
        ];
        let now = at(2024, 1, 10, 0, 0, 0);
        let result = apply_at(&expenses, &FilterState::preset(DatePreset::LastMonth), now);
        assert_eq!(dates(&result), vec![at(2023, 12, 1, 0, 0, 0)]);
    }

    #[test]
    fn test_custom_is_end_inclusive() {
        let expenses = vec![
            expense(100, "a", at(2024, 1, 31, 23, 59, 59)),
            expense(200, "a", at(2024, 2, 1, 0, 0, 1)),
            expense(300, "a", at(2024, 1, 1, 0, 0, 0)),
        ];
        let filter = FilterState::custom(day(2024, 1, 1), day(2024, 1, 31));
        let result = apply_at(&expenses, &filter, at(2030, 1, 1, 0, 0, 0));
        assert_eq!(
            dates(&result),
            vec![at(2024, 1, 31, 23, 59, 59), at(2024, 1, 1, 0, 0, 0)]
        );
    }

    #[test]
    fn test_custom_single_day_and_inverted_range() {
        let expenses = vec![expense(100, "a", at(2024, 3, 5, 18, 0, 0))];
        let single = FilterState::custom(day(2024, 3, 5), day(2024, 3, 5));
        assert_eq!(apply_at(&expenses, &single, at(2024, 3, 5, 0, 0, 0)).len(), 1);

        let inverted = FilterState::custom(day(2024, 3, 6), day(2024, 3, 4));
        let result = apply_at(&expenses, &inverted, at(2024, 3, 5, 0, 0, 0));
        assert!(result.is_empty());
        assert_eq!(result.total, Money::zero());
    }

    #[test]
    fn test_category_selection() {
        let expenses = vec![
            expense(100, "food", at(2024, 1, 1, 0, 0, 0)),
            expense(200, "rent", at(2024, 1, 2, 0, 0, 0)),
            expense(300, "fun", at(2024, 1, 3, 0, 0, 0)),
        ];
        let filter = FilterState::preset(DatePreset::All)
            .with_categories([CategoryId::from("food"), CategoryId::from("fun")]);
        let result = apply_at(&expenses, &filter, at(2024, 1, 1, 0, 0, 0));
        assert_eq!(result.len(), 2);
        assert_eq!(result.total, Money::from_cents(400));
        assert!(filter.is_active());
        assert!(!FilterState::preset(DatePreset::All).is_active());
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let when = at(2024, 1, 1, 9, 0, 0);
        let expenses = vec![
            expense(1, "a", when),
            expense(2, "b", when),
            expense(3, "c", when),
        ];
        let result = apply_at(&expenses, &FilterState::default(), when);
        let amounts: Vec<i64> = result.expenses.iter().map(|e| e.amount.cents()).collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }

    #[test]
    fn test_effective_range() {
        let now = at(2024, 3, 15, 0, 0, 0);
        assert!(FilterState::preset(DatePreset::All).effective_date_range(now).is_none());

        let range = FilterState::preset(DatePreset::ThisMonth)
            .effective_date_range(now)
            .unwrap();
        assert_eq!(range.start, at(2024, 3, 1, 0, 0, 0));
        assert_eq!(range.end, at(2024, 4, 1, 0, 0, 0));
        assert!(!range.end_inclusive);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(DatePreset::parse("this-month"), Some(DatePreset::ThisMonth));
        assert_eq!(DatePreset::parse("LAST_MONTH"), Some(DatePreset::LastMonth));
        assert_eq!(DatePreset::parse("weekly"), None);
    }
}
