//! Pipeline orchestration
//!
//! This module provides the high-level API for healthdash. It pulls raw samples
//! from a [`HealthStore`], folds them into daily points and derives every series
//! the dashboard charts, plus thin JSON entry points over the individual
//! derivations for the FFI layer and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{average, average_by_weekday, daily_differentials, minimum};
use crate::calendar::{Calendar, DateInterval};
use crate::config::DashboardConfig;
use crate::error::{ComputeError, HealthStoreError};
use crate::rollup::{daily_most_recent, daily_sum};
use crate::sleep::{night_breakdowns, score_nights, NightBreakdown};
use crate::store::{HealthSnapshot, HealthStore, SnapshotStore};
use crate::types::{ChartPoint, HealthMetricKind, NightScore, Sample, SleepInterval, WeekdayPoint};

/// Daily totals of a cumulative metric and its weekday view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub kind: HealthMetricKind,
    pub title: String,
    pub unit: String,
    pub daily: Vec<ChartPoint>,
    pub by_weekday: Vec<WeekdayPoint>,
    pub average: f64,
}

impl MetricSeries {
    fn from_daily(kind: HealthMetricKind, calendar: &Calendar, daily: Vec<Sample>) -> Self {
        let values: Vec<f64> = daily.iter().map(|s| s.value).collect();
        Self {
            kind,
            title: kind.title().to_string(),
            unit: kind.unit().to_string(),
            by_weekday: average_by_weekday(calendar, &daily),
            average: average(&values),
            daily: daily.into_iter().map(ChartPoint::from).collect(),
        }
    }
}

/// Latest daily weight and its mean day-over-day change per weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSeries {
    pub title: String,
    pub unit: String,
    pub daily: Vec<ChartPoint>,
    pub average: f64,
    pub minimum: Option<f64>,
    pub diffs_by_weekday: Vec<WeekdayPoint>,
}

/// Nightly sleep scores and their weekday view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSeries {
    pub title: String,
    pub unit: String,
    pub nightly: Vec<NightScore>,
    pub nights: Vec<NightBreakdown>,
    pub by_weekday: Vec<WeekdayPoint>,
    pub average: f64,
}

/// Every series shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSeries {
    pub generated_at: DateTime<Utc>,
    pub interval: DateInterval,
    pub utc_offset_minutes: i32,
    pub steps: MetricSeries,
    pub active_energy: MetricSeries,
    pub weight: WeightSeries,
    pub sleep: SleepSeries,
}

/// Builds dashboard series from a health store
pub struct DashboardProcessor {
    config: DashboardConfig,
    calendar: Calendar,
}

impl Default for DashboardProcessor {
    fn default() -> Self {
        Self {
            config: DashboardConfig::default(),
            calendar: Calendar::utc(),
        }
    }
}

impl DashboardProcessor {
    /// Create a processor, rejecting invalid configuration up front
    pub fn new(config: DashboardConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let calendar = config.calendar()?;
        Ok(Self { config, calendar })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Fetch everything the dashboard needs and derive its series.
    ///
    /// A metric without data in range yields empty series; any other store
    /// failure aborts the build.
    pub fn build(
        &self,
        store: &dyn HealthStore,
        now: DateTime<Utc>,
    ) -> Result<DashboardSeries, ComputeError> {
        let interval = self.calendar.date_interval(now, self.config.lookback_days);
        let diff_interval = self
            .calendar
            .date_interval(now, self.config.weight_diff_lookback_days);

        let steps = self.cumulative_series(store, HealthMetricKind::Steps, &interval)?;
        let active_energy =
            self.cumulative_series(store, HealthMetricKind::ActiveEnergy, &interval)?;
        let weight = self.weight_series(store, &interval, &diff_interval)?;
        let sleep = self.sleep_series(store, &interval)?;

        tracing::debug!(
            steps = steps.daily.len(),
            active_energy = active_energy.daily.len(),
            weight = weight.daily.len(),
            nights = sleep.nightly.len(),
            "built dashboard series"
        );

        Ok(DashboardSeries {
            generated_at: now,
            interval,
            utc_offset_minutes: self.config.utc_offset_minutes,
            steps,
            active_energy,
            weight,
            sleep,
        })
    }

    fn cumulative_series(
        &self,
        store: &dyn HealthStore,
        kind: HealthMetricKind,
        interval: &DateInterval,
    ) -> Result<MetricSeries, ComputeError> {
        let samples = or_empty(kind, store.fetch_samples(kind, interval))?;
        let daily = daily_sum(&self.calendar, &samples);
        Ok(MetricSeries::from_daily(kind, &self.calendar, daily))
    }

    fn weight_series(
        &self,
        store: &dyn HealthStore,
        interval: &DateInterval,
        diff_interval: &DateInterval,
    ) -> Result<WeightSeries, ComputeError> {
        let kind = HealthMetricKind::Weight;

        let samples = or_empty(kind, store.fetch_samples(kind, interval))?;
        let daily = daily_most_recent(&self.calendar, &samples);

        let diff_samples = or_empty(kind, store.fetch_samples(kind, diff_interval))?;
        let diff_daily = daily_most_recent(&self.calendar, &diff_samples);

        let values: Vec<f64> = daily.iter().map(|s| s.value).collect();
        Ok(WeightSeries {
            title: kind.title().to_string(),
            unit: kind.unit().to_string(),
            average: average(&values),
            minimum: minimum(&values),
            diffs_by_weekday: daily_differentials(&self.calendar, &diff_daily),
            daily: daily.into_iter().map(ChartPoint::from).collect(),
        })
    }

    fn sleep_series(
        &self,
        store: &dyn HealthStore,
        interval: &DateInterval,
    ) -> Result<SleepSeries, ComputeError> {
        let intervals = or_empty(HealthMetricKind::Sleep, store.fetch_sleep(interval))?;
        let nights = night_breakdowns(&self.calendar, &intervals);

        let nightly: Vec<NightScore> = nights
            .iter()
            .map(|night| NightScore {
                date: night.date,
                value: night.score,
            })
            .collect();
        let values: Vec<f64> = nightly.iter().map(|n| n.value).collect();
        let as_samples: Vec<Sample> = nightly.iter().map(|n| Sample::new(n.date, n.value)).collect();

        Ok(SleepSeries {
            title: HealthMetricKind::Sleep.title().to_string(),
            unit: HealthMetricKind::Sleep.unit().to_string(),
            by_weekday: average_by_weekday(&self.calendar, &as_samples),
            average: average(&values),
            nightly,
            nights,
        })
    }
}

/// Treat "no data in range" as an empty series
fn or_empty<T>(
    kind: HealthMetricKind,
    result: Result<Vec<T>, HealthStoreError>,
) -> Result<Vec<T>, ComputeError> {
    match result {
        Ok(items) => Ok(items),
        Err(HealthStoreError::NoData) => {
            tracing::debug!(metric = kind.as_str(), "no data in range");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Build dashboard series from a [`HealthSnapshot`] JSON document.
///
/// # Example
/// ```ignore
/// let dashboard = dashboard_to_json(snapshot_json, &DashboardConfig::default(), Utc::now())?;
/// ```
pub fn dashboard_to_json(
    snapshot_json: &str,
    config: &DashboardConfig,
    now: DateTime<Utc>,
) -> Result<String, ComputeError> {
    let snapshot = HealthSnapshot::from_json(snapshot_json)?;
    let store = SnapshotStore::new(snapshot);
    let processor = DashboardProcessor::new(config.clone())?;
    let dashboard = processor.build(&store, now)?;
    Ok(serde_json::to_string(&dashboard)?)
}

/// Weekday averages for a JSON array of samples
pub fn weekday_averages_to_json(samples_json: &str, utc_offset_minutes: i32) -> Result<String, ComputeError> {
    let calendar = Calendar::with_offset_minutes(utc_offset_minutes)?;
    let samples: Vec<Sample> = serde_json::from_str(samples_json)?;
    Ok(serde_json::to_string(&average_by_weekday(&calendar, &samples))?)
}

/// Weekday-averaged day-over-day changes for a JSON array of date-ordered samples
pub fn weight_differentials_to_json(
    samples_json: &str,
    utc_offset_minutes: i32,
) -> Result<String, ComputeError> {
    let calendar = Calendar::with_offset_minutes(utc_offset_minutes)?;
    let samples: Vec<Sample> = serde_json::from_str(samples_json)?;
    Ok(serde_json::to_string(&daily_differentials(&calendar, &samples))?)
}

/// Nightly scores for a JSON array of sleep intervals
pub fn sleep_scores_to_json(intervals_json: &str, utc_offset_minutes: i32) -> Result<String, ComputeError> {
    let calendar = Calendar::with_offset_minutes(utc_offset_minutes)?;
    let intervals: Vec<SleepInterval> = serde_json::from_str(intervals_json)?;
    Ok(serde_json::to_string(&score_nights(&calendar, &intervals))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AuthorizationStatus;
    use crate::types::SleepStage;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, m, d, h, 0, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(5, 28, 15)
    }

    fn sample_snapshot() -> HealthSnapshot {
        let mut snapshot = HealthSnapshot::default();

        for d in 1..=28 {
            snapshot.steps.push(Sample::new(at(5, d, 8), 3000.0));
            snapshot.steps.push(Sample::new(at(5, d, 18), 5000.0));
            snapshot.active_energy.push(Sample::new(at(5, d, 12), 400.0 + d as f64));
        }

        // April 30 sits outside the 28-day window but inside the 29-day one
        snapshot.weight.push(Sample::new(at(4, 30, 7), 171.0));
        snapshot.weight.push(Sample::new(at(5, 1, 7), 172.0));
        snapshot.weight.push(Sample::new(at(5, 1, 21), 170.5));
        snapshot.weight.push(Sample::new(at(5, 2, 7), 170.0));

        let night = at(5, 1, 1);
        snapshot.sleep.push(SleepInterval::new(night, night + Duration::minutes(90), SleepStage::Deep));
        snapshot.sleep.push(SleepInterval::new(
            night + Duration::minutes(90),
            night + Duration::minutes(210),
            SleepStage::Rem,
        ));
        snapshot.sleep.push(SleepInterval::new(
            night + Duration::minutes(210),
            night + Duration::minutes(480),
            SleepStage::Core,
        ));
        snapshot
    }

    #[test]
    fn test_build_dashboard() {
        let store = SnapshotStore::new(sample_snapshot());
        let dashboard = DashboardProcessor::default().build(&store, now()).unwrap();

        assert_eq!(dashboard.interval.start, at(5, 1, 0));
        assert_eq!(dashboard.interval.end, at(5, 29, 0));

        assert_eq!(dashboard.steps.daily.len(), 28);
        assert!(dashboard.steps.daily.iter().all(|p| p.value == 8000.0));
        assert_eq!(dashboard.steps.by_weekday.len(), 7);
        assert_eq!(dashboard.steps.average, 8000.0);

        assert_eq!(dashboard.active_energy.daily[0].value, 401.0);
        assert_eq!(dashboard.active_energy.average, 414.5);

        // The charted weights only cover May; differentials reach back to April 30
        assert_eq!(
            dashboard.weight.daily,
            vec![
                ChartPoint { date: at(5, 1, 0), value: 170.5 },
                ChartPoint { date: at(5, 2, 0), value: 170.0 },
            ]
        );
        assert_eq!(dashboard.weight.minimum, Some(170.0));
        assert_eq!(
            dashboard.weight.diffs_by_weekday,
            vec![
                WeekdayPoint { date: at(5, 1, 0), value: -0.5 },
                WeekdayPoint { date: at(5, 2, 0), value: -0.5 },
            ]
        );

        assert_eq!(dashboard.sleep.nightly.len(), 1);
        assert!((dashboard.sleep.nightly[0].value - 69.174603).abs() < 1e-6);
        assert_eq!(dashboard.sleep.by_weekday.len(), 1);
        assert_eq!(dashboard.sleep.average, dashboard.sleep.nightly[0].value);
    }

    #[test]
    fn test_missing_metrics_yield_empty_series() {
        let store = SnapshotStore::new(HealthSnapshot::default());
        let dashboard = DashboardProcessor::default().build(&store, now()).unwrap();

        assert!(dashboard.steps.daily.is_empty());
        assert_eq!(dashboard.steps.average, 0.0);
        assert!(dashboard.weight.diffs_by_weekday.is_empty());
        assert_eq!(dashboard.weight.minimum, None);
        assert!(dashboard.sleep.nightly.is_empty());
    }

    #[test]
    fn test_undetermined_authorization_aborts() {
        let mut snapshot = sample_snapshot();
        snapshot
            .authorization
            .insert(HealthMetricKind::Steps, AuthorizationStatus::NotDetermined);
        let store = SnapshotStore::new(snapshot);

        let result = DashboardProcessor::default().build(&store, now());
        assert!(matches!(
            result,
            Err(ComputeError::Store(HealthStoreError::AuthNotDetermined))
        ));
    }

    #[test]
    fn test_offset_moves_day_boundaries() {
        let config = DashboardConfig {
            utc_offset_minutes: -300,
            ..Default::default()
        };
        let mut snapshot = HealthSnapshot::default();
        // 02:00 UTC on May 10 is the evening of May 9 at UTC-05:00
        snapshot.steps.push(Sample::new(at(5, 10, 2), 700.0));
        snapshot.steps.push(Sample::new(at(5, 9, 15), 300.0));

        let store = SnapshotStore::new(snapshot);
        let dashboard = DashboardProcessor::new(config).unwrap().build(&store, now()).unwrap();

        assert_eq!(dashboard.steps.daily, vec![ChartPoint { date: at(5, 9, 5), value: 1000.0 }]);
    }

    #[test]
    fn test_dashboard_to_json() {
        let snapshot_json = sample_snapshot().to_json().unwrap();
        let json = dashboard_to_json(&snapshot_json, &DashboardConfig::default(), now()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["steps"]["kind"], "steps");
        assert_eq!(value["active_energy"]["title"], "Activity");
        assert_eq!(value["active_energy"]["unit"], "kcal");
        assert_eq!(value["weight"]["unit"], "lb");
        assert_eq!(value["sleep"]["title"], "Sleep");
        assert_eq!(value["steps"]["daily"].as_array().unwrap().len(), 28);
        assert_eq!(value["utc_offset_minutes"], 0);
        assert!(value["sleep"]["nights"][0]["deep_hours"].as_f64().is_some());
    }

    #[test]
    fn test_json_entry_points() {
        let samples = r#"[
            {"date": "2025-05-05T08:00:00Z", "value": 10.0},
            {"date": "2025-05-12T08:00:00Z", "value": 20.0},
            {"date": "2025-05-06T08:00:00Z", "value": 5.0}
        ]"#;
        let json = weekday_averages_to_json(samples, 0).unwrap();
        let points: Vec<WeekdayPoint> = serde_json::from_str(&json).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 15.0);
        assert_eq!(points[1].value, 5.0);

        let json = weight_differentials_to_json("[]", 0).unwrap();
        assert_eq!(json, "[]");

        let intervals = r#"[
            {"start": "2025-05-01T01:00:00Z", "end": "2025-05-01T01:00:00Z", "stage": "deep"}
        ]"#;
        assert_eq!(sleep_scores_to_json(intervals, 0).unwrap(), "[]");

        assert!(matches!(
            weekday_averages_to_json("not json", 0),
            Err(ComputeError::JsonError(_))
        ));
    }

    #[test]
    fn test_oversized_lookback_is_rejected_before_building() {
        let config = DashboardConfig {
            lookback_days: 4_000_000_000,
            weight_diff_lookback_days: 4_000_000_000,
            ..Default::default()
        };
        assert!(matches!(
            dashboard_to_json("{}", &config, now()),
            Err(ComputeError::InvalidConfig(_))
        ));
    }
}
