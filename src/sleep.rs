//! Sleep scoring
//!
//! Raw sleep-stage intervals are grouped into nights (keyed by the calendar day
//! each interval starts on) and every night receives a composite 0-100 score:
//! - Duration sub-score, peaking across the recommended 7-9 hours
//! - Quality sub-score, from how close deep and REM proportions sit to their ideals
//! - Composite: 60% duration, 40% quality, clamped to 0-100

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::types::{NightScore, SleepInterval, SleepStage};

/// Ideal share of deep sleep, in percent of total sleep
pub const IDEAL_DEEP_PCT: f64 = 17.5;

/// Ideal share of REM sleep, in percent of total sleep
pub const IDEAL_REM_PCT: f64 = 22.5;

const DURATION_WEIGHT: f64 = 0.6;
const QUALITY_WEIGHT: f64 = 0.4;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Accumulated stage durations for one night, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NightTally {
    pub total_seconds: f64,
    pub deep_seconds: f64,
    pub rem_seconds: f64,
    pub light_seconds: f64,
}

impl NightTally {
    fn add(&mut self, interval: &SleepInterval) {
        let seconds = interval.duration_seconds();
        self.total_seconds += seconds;

        match interval.stage {
            SleepStage::Deep => self.deep_seconds += seconds,
            SleepStage::Rem => self.rem_seconds += seconds,
            SleepStage::Core | SleepStage::Unspecified => self.light_seconds += seconds,
            SleepStage::Other => {}
        }
    }
}

/// Per-night hours and sub-scores behind a [`NightScore`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NightBreakdown {
    pub date: DateTime<Utc>,
    pub total_hours: f64,
    pub deep_hours: f64,
    pub rem_hours: f64,
    pub light_hours: f64,
    pub duration_score: f64,
    pub quality_score: f64,
    pub score: f64,
}

impl NightBreakdown {
    /// Score a tallied night; `None` when no sleep time was recorded
    fn from_tally(date: DateTime<Utc>, tally: &NightTally) -> Option<Self> {
        let total_hours = tally.total_seconds / SECONDS_PER_HOUR;
        if total_hours <= 0.0 {
            tracing::debug!(night = %date, "skipping night with no recorded sleep");
            return None;
        }

        let deep_hours = tally.deep_seconds / SECONDS_PER_HOUR;
        let rem_hours = tally.rem_seconds / SECONDS_PER_HOUR;
        let light_hours = tally.light_seconds / SECONDS_PER_HOUR;

        let duration_score = duration_score(total_hours);
        let quality_score = quality_score(total_hours, deep_hours, rem_hours);
        let raw = duration_score * DURATION_WEIGHT + quality_score * QUALITY_WEIGHT;

        Some(Self {
            date,
            total_hours,
            deep_hours,
            rem_hours,
            light_hours,
            duration_score,
            quality_score,
            score: raw.clamp(0.0, 100.0),
        })
    }
}

/// Sum stage durations per night, ascending by night
pub fn tally_nights(
    calendar: &Calendar,
    intervals: &[SleepInterval],
) -> BTreeMap<DateTime<Utc>, NightTally> {
    let mut nights: BTreeMap<DateTime<Utc>, NightTally> = BTreeMap::new();

    for interval in intervals {
        nights
            .entry(calendar.start_of_day(interval.start))
            .or_default()
            .add(interval);
    }

    nights
}

/// Hours and sub-scores for every night with recorded sleep, ascending by date
pub fn night_breakdowns(calendar: &Calendar, intervals: &[SleepInterval]) -> Vec<NightBreakdown> {
    let nights: Vec<NightBreakdown> = tally_nights(calendar, intervals)
        .iter()
        .filter_map(|(date, tally)| NightBreakdown::from_tally(*date, tally))
        .collect();
    tracing::trace!(intervals = intervals.len(), nights = nights.len(), "scored nights");
    nights
}

/// One composite score per night with recorded sleep, ascending by date
pub fn score_nights(calendar: &Calendar, intervals: &[SleepInterval]) -> Vec<NightScore> {
    night_breakdowns(calendar, intervals)
        .into_iter()
        .map(|night| NightScore {
            date: night.date,
            value: night.score,
        })
        .collect()
}

/// Duration sub-score (0-100 before the penalty for oversleeping)
///
/// ```text
/// < 5h     40 * h/5
/// [5, 7)   40 + 30 * (h-5)/2
/// [7, 9]   70 + 30 * (h-7)/2
/// > 9h     100 - (h-9) * 10
/// ```
pub fn duration_score(total_hours: f64) -> f64 {
    if total_hours < 5.0 {
        40.0 * (total_hours / 5.0)
    } else if total_hours < 7.0 {
        40.0 + 30.0 * ((total_hours - 5.0) / 2.0)
    } else if total_hours <= 9.0 {
        70.0 + 30.0 * ((total_hours - 7.0) / 2.0)
    } else {
        100.0 - (total_hours - 9.0) * 10.0
    }
}

/// Quality sub-score (0-50) from deep and REM proportions.
///
/// `total_hours` must be positive.
pub fn quality_score(total_hours: f64, deep_hours: f64, rem_hours: f64) -> f64 {
    let deep_pct = deep_hours / total_hours * 100.0;
    let rem_pct = rem_hours / total_hours * 100.0;

    let deep_score = proportion_score(deep_pct, IDEAL_DEEP_PCT);
    let rem_score = proportion_score(rem_pct, IDEAL_REM_PCT);

    (deep_score + rem_score) / 2.0
}

/// 50 at the ideal share, falling linearly to 0 once the gap reaches the ideal itself
fn proportion_score(pct: f64, ideal: f64) -> f64 {
    50.0 - (pct - ideal).abs().min(ideal) * (50.0 / ideal)
}
