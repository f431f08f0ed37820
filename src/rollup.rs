//! Daily rollups
//!
//! Health sources report many samples per day (step buckets, repeated weigh-ins).
//! Charts want one point per day, so raw samples are folded per calendar day:
//! cumulative metrics are summed, point-in-time metrics keep the latest reading.
//! Days without samples produce no point.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::calendar::Calendar;
use crate::types::Sample;

/// Sum of sample values per calendar day, dated at each day's start
pub fn daily_sum(calendar: &Calendar, samples: &[Sample]) -> Vec<Sample> {
    let mut days: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

    for sample in samples {
        *days.entry(calendar.start_of_day(sample.date)).or_insert(0.0) += sample.value;
    }

    days.into_iter()
        .map(|(date, value)| Sample::new(date, value))
        .collect()
}

/// Latest reading per calendar day, dated at each day's start.
///
/// When two readings share a timestamp the later one in the input wins.
pub fn daily_most_recent(calendar: &Calendar, samples: &[Sample]) -> Vec<Sample> {
    let mut days: BTreeMap<DateTime<Utc>, Sample> = BTreeMap::new();

    for sample in samples {
        days.entry(calendar.start_of_day(sample.date))
            .and_modify(|latest| {
                if sample.date >= latest.date {
                    *latest = *sample;
                }
            })
            .or_insert(*sample);
    }

    days.into_iter()
        .map(|(date, latest)| Sample::new(date, latest.value))
        .collect()
}
