//! Metric aggregation
//!
//! This module derives the weekday views shown on the dashboard:
//! - Mean value per weekday (steps, active energy, sleep scores)
//! - Mean day-over-day change per weekday (weight)
//!
//! Weekday buckets are keyed by [`Calendar::weekday_index`] alone, so a bucket
//! mixes samples from different weeks. Each bucket is dated by the first sample
//! it received in input order; charts match on that date, so it is kept as-is
//! rather than normalized.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::calendar::Calendar;
use crate::types::{Sample, WeekdayPoint};

/// Running sum for one weekday
struct WeekdayBucket {
    first_date: DateTime<Utc>,
    total: f64,
    count: usize,
}

impl WeekdayBucket {
    fn starting_at(first_date: DateTime<Utc>) -> Self {
        Self {
            first_date,
            total: 0.0,
            count: 0,
        }
    }

    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn into_point(self) -> WeekdayPoint {
        WeekdayPoint {
            date: self.first_date,
            value: self.total / self.count as f64,
        }
    }
}

/// Average sample values by weekday.
///
/// Returns one point per weekday that received at least one sample, ordered
/// Sunday through Saturday. Empty input yields an empty series.
pub fn average_by_weekday(calendar: &Calendar, samples: &[Sample]) -> Vec<WeekdayPoint> {
    let mut buckets: BTreeMap<u32, WeekdayBucket> = BTreeMap::new();

    for sample in samples {
        buckets
            .entry(calendar.weekday_index(sample.date))
            .or_insert_with(|| WeekdayBucket::starting_at(sample.date))
            .add(sample.value);
    }

    let points: Vec<WeekdayPoint> = buckets.into_values().map(WeekdayBucket::into_point).collect();
    tracing::trace!(samples = samples.len(), weekdays = points.len(), "averaged by weekday");
    points
}

/// Change from each sample to the next, dated by the later sample.
///
/// The input is taken in index order; callers sort it by date beforehand.
pub fn differences(samples: &[Sample]) -> Vec<Sample> {
    samples
        .windows(2)
        .map(|pair| Sample::new(pair[1].date, pair[1].value - pair[0].value))
        .collect()
}

/// Average day-over-day change by weekday.
///
/// `samples` must be ascending by date. Fewer than two samples yields an
/// empty series.
pub fn daily_differentials(calendar: &Calendar, samples: &[Sample]) -> Vec<WeekdayPoint> {
    average_by_weekday(calendar, &differences(samples))
}

/// Arithmetic mean, or 0 for an empty slice
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn minimum(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}
