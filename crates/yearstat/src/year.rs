//! Calendar-year windows in UTC.

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::error::StatsError;

/// The closed interval `[Jan 1 00:00:00, Dec 31 23:59:59]` of one UTC year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    year: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl YearWindow {
    /// Window for `year`, which must lie in `1..=9999`.
    pub fn new(year: i32) -> Result<Self, StatsError> {
        if !(1..=9999).contains(&year) {
            return Err(StatsError::InvalidYear(year));
        }
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or(StatsError::InvalidYear(year))?;
        let end = Utc
            .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
            .single()
            .ok_or(StatsError::InvalidYear(year))?;
        Ok(Self { year, start, end })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// ISO-8601 lower bound, e.g. `2024-01-01T00:00:00Z`.
    pub fn since(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// ISO-8601 upper bound, e.g. `2024-12-31T23:59:59Z`.
    pub fn until(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Search-syntax date range, e.g. `2024-01-01..2024-12-31`.
    pub fn date_range(&self) -> String {
        format!(
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Whether a week starting at `timestamp` (Unix seconds) belongs to `year`.
///
/// Only the UTC year of the week start matters: a week that begins on
/// Dec 29 is attributed to the old year in full.
pub fn week_in_year(timestamp: i64, year: i32) -> bool {
    DateTime::from_timestamp(timestamp, 0).is_some_and(|start| start.year() == year)
}
