//! Chart selection helpers
//!
//! Interactive charts report a raw selection (a date under the cursor, or an
//! angle in a weekday pie) and need the data point it lands on.

use chrono::{DateTime, Utc};

use crate::calendar::Calendar;
use crate::types::ChartPoint;

/// First point dated on the same calendar day as `day`.
///
/// Returns `None` when there is no selection or no point on that day. With
/// duplicate days the earliest point in the slice wins.
pub fn find_by_calendar_day<'a>(
    calendar: &Calendar,
    points: &'a [ChartPoint],
    day: Option<DateTime<Utc>>,
) -> Option<&'a ChartPoint> {
    let day = day?;
    points
        .iter()
        .find(|point| calendar.is_same_day(point.date, day))
}

/// Point whose slice of a cumulative total contains `selected`.
///
/// Pie charts lay points end to end by value; the selection is a position along
/// that total. Returns `None` for an empty slice or a position past the end.
pub fn select_by_cumulative_value(points: &[ChartPoint], selected: f64) -> Option<&ChartPoint> {
    let mut total = 0.0;
    points.iter().find(|point| {
        total += point.value;
        selected <= total
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, d, h, 0, 0).unwrap()
    }

    fn points() -> Vec<ChartPoint> {
        vec![
            ChartPoint { date: at(1, 0), value: 100.0 },
            ChartPoint { date: at(2, 0), value: 200.0 },
            ChartPoint { date: at(2, 12), value: 250.0 },
            ChartPoint { date: at(3, 0), value: 300.0 },
        ]
    }

    #[test]
    fn test_find_matches_calendar_day() {
        let points = points();
        let found = find_by_calendar_day(&Calendar::utc(), &points, Some(at(3, 18)));
        assert_eq!(found, Some(&points[3]));
    }

    #[test]
    fn test_find_returns_first_duplicate() {
        let points = points();
        let found = find_by_calendar_day(&Calendar::utc(), &points, Some(at(2, 23)));
        assert_eq!(found.map(|p| p.value), Some(200.0));
    }

    #[test]
    fn test_find_without_selection_or_match() {
        let points = points();
        assert!(find_by_calendar_day(&Calendar::utc(), &points, None).is_none());
        assert!(find_by_calendar_day(&Calendar::utc(), &points, Some(at(9, 0))).is_none());
        assert!(find_by_calendar_day(&Calendar::utc(), &[], Some(at(1, 0))).is_none());
    }

    #[test]
    fn test_find_uses_calendar_offset() {
        // 2025-05-02 01:00 UTC is still May 1 at UTC-05:00
        let cal = Calendar::with_offset_minutes(-300).unwrap();
        let points = vec![ChartPoint { date: at(1, 12), value: 7.0 }];
        assert!(find_by_calendar_day(&cal, &points, Some(at(2, 1))).is_some());
        assert!(find_by_calendar_day(&Calendar::utc(), &points, Some(at(2, 1))).is_none());
    }

    #[test]
    fn test_cumulative_selection() {
        let points = points();
        assert_eq!(select_by_cumulative_value(&points, 0.0).map(|p| p.value), Some(100.0));
        assert_eq!(select_by_cumulative_value(&points, 100.0).map(|p| p.value), Some(100.0));
        assert_eq!(select_by_cumulative_value(&points, 100.5).map(|p| p.value), Some(200.0));
        assert_eq!(select_by_cumulative_value(&points, 849.0).map(|p| p.value), Some(300.0));
        assert!(select_by_cumulative_value(&points, 851.0).is_none());
        assert!(select_by_cumulative_value(&[], 0.0).is_none());
    }
}
