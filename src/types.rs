//! Core types for the healthdash engine
//!
//! Inputs are raw [`Sample`]s and [`SleepInterval`]s handed over by the health
//! data source; outputs are [`ChartPoint`] series ready for a charting layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One health measurement (steps, kilocalories, pounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(date: DateTime<Utc>, value: f64) -> Self {
        Self { date, value }
    }
}

/// Sleep stage classification
///
/// Tags the engine does not score (in bed, awake, vendor extensions) all land
/// in `Other` when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Deep,
    Rem,
    Core,
    Unspecified,
    #[serde(other)]
    Other,
}

impl SleepStage {
    /// Core and unspecified sleep count as light sleep
    pub fn is_light(&self) -> bool {
        matches!(self, SleepStage::Core | SleepStage::Unspecified)
    }
}

/// One contiguous sleep-stage segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stage: SleepStage,
}

impl SleepInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, stage: SleepStage) -> Self {
        Self { start, end, stage }
    }

    /// Length of the segment in seconds; inverted segments count as zero
    pub fn duration_seconds(&self) -> f64 {
        let millis = (self.end - self.start).num_milliseconds();
        (millis as f64 / 1000.0).max(0.0)
    }
}

/// A date/value pair handed to the charting layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl From<Sample> for ChartPoint {
    fn from(sample: Sample) -> Self {
        Self {
            date: sample.date,
            value: sample.value,
        }
    }
}

/// Mean value of one weekday bucket, dated by the bucket's first sample
pub type WeekdayPoint = ChartPoint;

/// Composite 0-100 sleep score for one night, dated at the night's start of day
pub type NightScore = ChartPoint;

/// The metrics shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetricKind {
    Steps,
    Weight,
    ActiveEnergy,
    Sleep,
}

impl HealthMetricKind {
    pub const ALL: [HealthMetricKind; 4] = [
        HealthMetricKind::Steps,
        HealthMetricKind::Weight,
        HealthMetricKind::ActiveEnergy,
        HealthMetricKind::Sleep,
    ];

    /// Look up a metric by its `as_str` name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthMetricKind::Steps => "steps",
            HealthMetricKind::Weight => "weight",
            HealthMetricKind::ActiveEnergy => "active_energy",
            HealthMetricKind::Sleep => "sleep",
        }
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        match self {
            HealthMetricKind::Steps => "Steps",
            HealthMetricKind::Weight => "Weight",
            HealthMetricKind::ActiveEnergy => "Activity",
            HealthMetricKind::Sleep => "Sleep",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            HealthMetricKind::Steps => "count",
            HealthMetricKind::Weight => "lb",
            HealthMetricKind::ActiveEnergy => "kcal",
            HealthMetricKind::Sleep => "score",
        }
    }

    /// Name used when the store refuses to share this metric
    pub fn sharing_label(&self) -> &'static str {
        match self {
            HealthMetricKind::Steps => "step count",
            HealthMetricKind::Weight => "weight",
            HealthMetricKind::ActiveEnergy => "active energy",
            HealthMetricKind::Sleep => "sleep analysis",
        }
    }
}
