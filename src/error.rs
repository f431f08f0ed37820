//! Error types for healthdash
//!
//! Two families live here. [`HealthStoreError`] is the closed set of failures a
//! health-data source can report at the collaborator boundary; [`ComputeError`]
//! covers everything the engine's own JSON and configuration surfaces can reject.
//! The derivation functions themselves never fail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by a health-data source
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthStoreError {
    #[error("Need Access to Health Data")]
    AuthNotDetermined,

    #[error("No Data")]
    NoData,

    #[error("Sharing Denied for {metric}")]
    SharingDenied { metric: String },

    #[error("Unable to Complete Request")]
    UnableToCompleteRequest,

    #[error("Invalid Input")]
    InvalidInput,
}

impl HealthStoreError {
    /// User-facing explanation shown beneath the error title
    pub fn failure_reason(&self) -> String {
        match self {
            HealthStoreError::AuthNotDetermined => {
                "You have not given access to your Health data. Please go to Settings > Health > Data Access & Devices.".to_string()
            }
            HealthStoreError::NoData => "No data available for the selected date range.".to_string(),
            HealthStoreError::SharingDenied { metric } => {
                format!("Please enable sharing for {metric} in Settings.")
            }
            HealthStoreError::UnableToCompleteRequest => {
                "An error occurred while processing the request.".to_string()
            }
            HealthStoreError::InvalidInput => {
                "Must be a numeric value with a maximum of 1 decimal place.".to_string()
            }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            HealthStoreError::AuthNotDetermined => "AUTH_NOT_DETERMINED",
            HealthStoreError::NoData => "NO_DATA",
            HealthStoreError::SharingDenied { .. } => "SHARING_DENIED",
            HealthStoreError::UnableToCompleteRequest => "UNABLE_TO_COMPLETE_REQUEST",
            HealthStoreError::InvalidInput => "INVALID_INPUT",
        }
    }
}

/// Errors raised by the engine's JSON, configuration and pipeline surfaces
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Health store error: {0}")]
    Store(#[from] HealthStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_and_reasons() {
        let err = HealthStoreError::SharingDenied {
            metric: "weight".to_string(),
        };
        assert_eq!(err.to_string(), "Sharing Denied for weight");
        assert_eq!(
            err.failure_reason(),
            "Please enable sharing for weight in Settings."
        );
        assert_eq!(err.code(), "SHARING_DENIED");

        assert_eq!(HealthStoreError::NoData.to_string(), "No Data");
        assert!(HealthStoreError::InvalidInput
            .failure_reason()
            .contains("1 decimal place"));
    }

    #[test]
    fn test_store_error_wraps_into_compute_error() {
        let err: ComputeError = HealthStoreError::AuthNotDetermined.into();
        assert_eq!(
            err.to_string(),
            "Health store error: Need Access to Health Data"
        );
    }

    #[test]
    fn test_store_error_serialization() {
        let err = HealthStoreError::SharingDenied {
            metric: "step count".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "sharing_denied");
        assert_eq!(json["metric"], "step count");
    }
}
