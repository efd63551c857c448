//! Calendar month periods
//!
//! Monthly totals and the "this month" / "last month" filter presets are all
//! computed against half-open month ranges: the first instant of the month up
//! to, but not including, the first instant of the next month.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month (e.g., "2025-01")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    /// Create a month period; returns `None` if `month` is not 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing the given instant
    pub fn containing(at: NaiveDateTime) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The month containing the local "now"
    pub fn current() -> Self {
        Self::containing(chrono::Local::now().naive_local())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// First instant of the month
    pub fn start(&self) -> NaiveDateTime {
        self.first_day().and_time(NaiveTime::MIN)
    }

    /// First instant of the following month (exclusive end of this one)
    pub fn end_exclusive(&self) -> NaiveDateTime {
        self.next().start()
    }

    /// Check if an instant falls within this month
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at.year() == self.year && at.month() == self.month
    }

    /// Get the next month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Get the previous month
    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_month() {
        assert!(MonthPeriod::new(2024, 0).is_none());
        assert!(MonthPeriod::new(2024, 13).is_none());
        assert!(MonthPeriod::new(2024, 12).is_some());
    }

    #[test]
    fn test_bounds() {
        let jan = MonthPeriod::new(2024, 1).unwrap();
        assert_eq!(jan.start(), ts(2024, 1, 1, 0, 0, 0));
        assert_eq!(jan.end_exclusive(), ts(2024, 2, 1, 0, 0, 0));
        assert!(jan.contains(ts(2024, 1, 31, 23, 59, 59)));
        assert!(!jan.contains(ts(2024, 2, 1, 0, 0, 0)));
    }

    #[test]
    fn test_navigation_wraps_years() {
        let dec = MonthPeriod::new(2024, 12).unwrap();
        assert_eq!(dec.next(), MonthPeriod::new(2025, 1).unwrap());

        let jan = MonthPeriod::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), MonthPeriod::new(2023, 12).unwrap());
        assert_eq!(jan.prev().next(), jan);
    }

    #[test]
    fn test_display() {
        assert_eq!(MonthPeriod::new(2025, 3).unwrap().to_string(), "2025-03");
    }
}
