//! CalendarDate value object for day-granular deadlines.
//!
//! Cycle start dates and renewal deadlines are dates, not instants; this
//! wrapper keeps the day arithmetic in one place and converts to concrete
//! event timestamps only at the reminder-window boundary.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Timestamp;

/// A calendar day without a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Returns today's date (UTC).
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Creates a date from a NaiveDate.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Creates a date from year/month/day, if valid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Returns the inner NaiveDate.
    pub fn as_naive(&self) -> &NaiveDate {
        &self.0
    }

    /// Returns the date shifted by the given number of days.
    ///
    /// Negative values move backwards.
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Returns a timestamp at the given wall-clock hour of this date.
    ///
    /// Hours outside 0..=23 clamp to end of day.
    pub fn at_hour(&self, hour: u32) -> Timestamp {
        let time = self
            .0
            .and_hms_opt(hour, 0, 0)
            .unwrap_or_else(|| self.0.and_hms_opt(23, 59, 59).expect("valid time"));
        Timestamp::from_datetime(time.and_utc())
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn plus_days_crosses_month_boundaries() {
        assert_eq!(date(2024, 1, 30).plus_days(5), date(2024, 2, 4));
        assert_eq!(date(2024, 3, 1).plus_days(-1), date(2024, 2, 29));
    }

    #[test]
    fn plus_days_180_matches_renewal_horizon() {
        assert_eq!(date(2024, 1, 1).plus_days(180), date(2024, 6, 29));
    }

    #[test]
    fn at_hour_produces_wall_clock_timestamp() {
        let ts = date(2024, 5, 10).at_hour(9);
        assert_eq!(
            ts.as_datetime().to_rfc3339(),
            "2024-05-10T09:00:00+00:00"
        );
    }

    #[test]
    fn at_hour_out_of_range_clamps_to_end_of_day() {
        let ts = date(2024, 5, 10).at_hour(99);
        assert_eq!(
            ts.as_datetime().to_rfc3339(),
            "2024-05-10T23:59:59+00:00"
        );
    }

    #[test]
    fn from_ymd_rejects_invalid_dates() {
        assert!(CalendarDate::from_ymd(2023, 2, 29).is_none());
        assert!(CalendarDate::from_ymd(2024, 13, 1).is_none());
    }

    #[test]
    fn display_uses_iso_format() {
        assert_eq!(date(2024, 12, 3).to_string(), "2024-12-03");
    }
}
