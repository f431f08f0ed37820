//! Calendar arithmetic
//!
//! Every bucketing decision in the engine (which weekday, which night, which day
//! a selection lands on) goes through a [`Calendar`]. A calendar pins one UTC
//! offset, so all calls made with the same calendar agree on day boundaries.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Fixed-offset calendar used to derive days and weekdays from UTC timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// Calendar whose days start at UTC midnight
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Calendar for a local offset east of UTC, in minutes
    pub fn with_offset_minutes(minutes: i32) -> Result<Self, ComputeError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                ComputeError::InvalidTimezone(format!(
                    "UTC offset of {minutes} minutes is out of range"
                ))
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day `t` falls on
    pub fn day(&self, t: DateTime<Utc>) -> NaiveDate {
        t.with_timezone(&self.offset).date_naive()
    }

    pub fn weekday(&self, t: DateTime<Utc>) -> Weekday {
        t.with_timezone(&self.offset).weekday()
    }

    /// Weekday index with Sunday = 1 through Saturday = 7
    pub fn weekday_index(&self, t: DateTime<Utc>) -> u32 {
        self.weekday(t).number_from_sunday()
    }

    /// Local midnight at or before `t`, expressed in UTC
    pub fn start_of_day(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let local_midnight = self.day(t).and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc_midnight, Utc)
    }

    /// Exclusive end of the day containing `t`
    pub fn end_of_day(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(t) + Duration::days(1)
    }

    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day(a) == self.day(b)
    }

    /// Interval covering the `days_back` whole days that end with the day of `end`.
    ///
    /// The upper bound is exclusive: it is the start of the day after `end`.
    pub fn date_interval(&self, end: DateTime<Utc>, days_back: u32) -> DateInterval {
        let end = self.end_of_day(end);
        let start = end - Duration::days(i64::from(days_back));
        DateInterval { start, end }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateInterval {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_weekday_index_sunday_first() {
        let cal = Calendar::utc();
        // 2025-05-04 is a Sunday
        assert_eq!(cal.weekday_index(at(2025, 5, 4, 12, 0)), 1);
        assert_eq!(cal.weekday_index(at(2025, 5, 5, 12, 0)), 2);
        assert_eq!(cal.weekday_index(at(2025, 5, 10, 12, 0)), 7);
    }

    #[test]
    fn test_offset_shifts_weekday() {
        // 23:30 UTC on Sunday is already Monday at UTC+02:00
        let cal = Calendar::with_offset_minutes(120).unwrap();
        assert_eq!(cal.weekday_index(at(2025, 5, 4, 23, 30)), 2);
        assert_eq!(Calendar::utc().weekday_index(at(2025, 5, 4, 23, 30)), 1);
    }

    #[test]
    fn test_start_of_day() {
        let cal = Calendar::utc();
        assert_eq!(cal.start_of_day(at(2025, 5, 4, 17, 45)), at(2025, 5, 4, 0, 0));

        // Local midnight at UTC-05:00 is 05:00 UTC
        let cal = Calendar::with_offset_minutes(-300).unwrap();
        assert_eq!(cal.start_of_day(at(2025, 5, 4, 17, 45)), at(2025, 5, 4, 5, 0));
        assert_eq!(cal.start_of_day(at(2025, 5, 4, 3, 0)), at(2025, 5, 3, 5, 0));
        assert_eq!(cal.end_of_day(at(2025, 5, 4, 3, 0)), at(2025, 5, 4, 5, 0));
    }

    #[test]
    fn test_date_interval() {
        let cal = Calendar::utc();
        let interval = cal.date_interval(at(2025, 5, 28, 9, 15), 28);

        assert_eq!(interval.end, at(2025, 5, 29, 0, 0));
        assert_eq!(interval.start, at(2025, 5, 1, 0, 0));
        assert_eq!(interval.duration(), Duration::days(28));

        assert!(interval.contains(at(2025, 5, 1, 0, 0)));
        assert!(interval.contains(at(2025, 5, 28, 23, 59)));
        assert!(!interval.contains(at(2025, 5, 29, 0, 0)));
        assert!(!interval.contains(at(2025, 4, 30, 23, 59)));
    }

    #[test]
    fn test_same_day() {
        let cal = Calendar::utc();
        assert!(cal.is_same_day(at(2025, 5, 4, 0, 0), at(2025, 5, 4, 23, 59)));
        assert!(!cal.is_same_day(at(2025, 5, 4, 23, 59), at(2025, 5, 5, 0, 0)));
    }

    #[test]
    fn test_invalid_offset() {
        assert!(Calendar::with_offset_minutes(24 * 60).is_err());
        assert!(Calendar::with_offset_minutes(i32::MAX).is_err());
        assert!(Calendar::with_offset_minutes(-(23 * 60 + 59)).is_ok());
    }
}
