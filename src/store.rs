//! Health-data source boundary
//!
//! The engine never talks to a platform health store directly. Hosts implement
//! [`HealthStore`] over whatever asynchronous API they have, resolve the calls,
//! and hand the results to the engine. [`SnapshotStore`] is the in-memory
//! implementation used by the CLI, the FFI layer and tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::calendar::DateInterval;
use crate::error::HealthStoreError;
use crate::types::{HealthMetricKind, Sample, SleepInterval};

/// Source of raw health samples
pub trait HealthStore {
    /// Scalar samples of `kind` dated inside `interval`
    fn fetch_samples(
        &self,
        kind: HealthMetricKind,
        interval: &DateInterval,
    ) -> Result<Vec<Sample>, HealthStoreError>;

    /// Sleep intervals that start inside `interval`
    fn fetch_sleep(&self, interval: &DateInterval) -> Result<Vec<SleepInterval>, HealthStoreError>;

    /// Record a new scalar sample of `kind`
    fn save_sample(&mut self, kind: HealthMetricKind, sample: Sample) -> Result<(), HealthStoreError>;
}

/// Per-metric permission state reported by the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    SharingDenied,
    #[default]
    SharingAuthorized,
}

/// Serializable copy of everything a health source holds for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    #[serde(default)]
    pub steps: Vec<Sample>,
    #[serde(default)]
    pub weight: Vec<Sample>,
    #[serde(default)]
    pub active_energy: Vec<Sample>,
    #[serde(default)]
    pub sleep: Vec<SleepInterval>,
    /// Metrics missing here are treated as authorized
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub authorization: HashMap<HealthMetricKind, AuthorizationStatus>,
}

impl HealthSnapshot {
    pub fn authorization_for(&self, kind: HealthMetricKind) -> AuthorizationStatus {
        self.authorization.get(&kind).copied().unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// [`HealthStore`] backed by a [`HealthSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshot: HealthSnapshot,
}

impl SnapshotStore {
    pub fn new(snapshot: HealthSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &HealthSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> HealthSnapshot {
        self.snapshot
    }

    fn ensure_readable(&self, kind: HealthMetricKind) -> Result<(), HealthStoreError> {
        match self.snapshot.authorization_for(kind) {
            AuthorizationStatus::NotDetermined => Err(HealthStoreError::AuthNotDetermined),
            _ => Ok(()),
        }
    }

    fn samples_mut(&mut self, kind: HealthMetricKind) -> Option<&mut Vec<Sample>> {
        match kind {
            HealthMetricKind::Steps => Some(&mut self.snapshot.steps),
            HealthMetricKind::Weight => Some(&mut self.snapshot.weight),
            HealthMetricKind::ActiveEnergy => Some(&mut self.snapshot.active_energy),
            HealthMetricKind::Sleep => None,
        }
    }
}

impl HealthStore for SnapshotStore {
    fn fetch_samples(
        &self,
        kind: HealthMetricKind,
        interval: &DateInterval,
    ) -> Result<Vec<Sample>, HealthStoreError> {
        self.ensure_readable(kind)?;

        let samples = match kind {
            HealthMetricKind::Steps => &self.snapshot.steps,
            HealthMetricKind::Weight => &self.snapshot.weight,
            HealthMetricKind::ActiveEnergy => &self.snapshot.active_energy,
            HealthMetricKind::Sleep => return Err(HealthStoreError::UnableToCompleteRequest),
        };

        let mut in_range: Vec<Sample> = samples
            .iter()
            .filter(|sample| interval.contains(sample.date))
            .copied()
            .collect();

        if in_range.is_empty() {
            return Err(HealthStoreError::NoData);
        }

        in_range.sort_by_key(|sample| sample.date);
        Ok(in_range)
    }

    fn fetch_sleep(&self, interval: &DateInterval) -> Result<Vec<SleepInterval>, HealthStoreError> {
        self.ensure_readable(HealthMetricKind::Sleep)?;

        let in_range: Vec<SleepInterval> = self
            .snapshot
            .sleep
            .iter()
            .filter(|segment| interval.contains(segment.start))
            .copied()
            .collect();

        if in_range.is_empty() {
            return Err(HealthStoreError::NoData);
        }

        Ok(in_range)
    }

    fn save_sample(&mut self, kind: HealthMetricKind, sample: Sample) -> Result<(), HealthStoreError> {
        match self.snapshot.authorization_for(kind) {
            AuthorizationStatus::NotDetermined => return Err(HealthStoreError::AuthNotDetermined),
            AuthorizationStatus::SharingDenied => {
                return Err(HealthStoreError::SharingDenied {
                    metric: kind.sharing_label().to_string(),
                })
            }
            AuthorizationStatus::SharingAuthorized => {}
        }

        if !sample.value.is_finite() {
            return Err(HealthStoreError::InvalidInput);
        }

        let samples = self
            .samples_mut(kind)
            .ok_or(HealthStoreError::UnableToCompleteRequest)?;
        samples.push(sample);
        Ok(())
    }
}
