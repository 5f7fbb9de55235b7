//! Calendar-day comparison and Sunday-aligned week ranges.
//!
//! Every value here is a local wall-clock date. Nothing is normalized
//! across time zones: two instants that straddle midnight in different
//! offsets compare by their local components only.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// True when year, month and day-of-month all match.
pub fn is_same_day<A: Datelike, B: Datelike>(a: &A, b: &B) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn week_range(date: NaiveDate) -> WeekRange {
    let start = week_start(date);
    WeekRange {
        start,
        end: start + Duration::days(6),
    }
}

/// Seven-day window from a Sunday to the following Saturday, both inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..7).map(move |offset| start + Duration::days(offset))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Same window moved by `weeks` whole weeks (negative goes back).
    pub fn shift_weeks(&self, weeks: i64) -> WeekRange {
        let delta = Duration::days(7 * weeks);
        WeekRange {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// `start`/`end` query parameters as ISO dates.
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}
