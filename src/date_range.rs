//! Inclusive calendar date ranges used by the reports.

use time::{Date, Duration};

/// An inclusive range of local calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day in the range.
    pub start: Date,
    /// The last day in the range.
    pub end: Date,
}

impl DateRange {
    /// The Monday through Sunday week containing `date`.
    pub fn week_of(date: Date) -> Self {
        let days_since_monday = date.weekday().number_days_from_monday();
        let start = date - Duration::days(days_since_monday.into());

        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: Date) -> Self {
        let last_day = date.month().length(date.year());

        Self {
            start: date.replace_day(1).unwrap_or(date),
            end: date.replace_day(last_day).unwrap_or(date),
        }
    }

    /// `days` days before `date` through `date` itself.
    pub fn trailing_days(date: Date, days: i64) -> Self {
        Self {
            start: date - Duration::days(days),
            end: date,
        }
    }
}
