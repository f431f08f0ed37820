//! Dashboard configuration
//!
//! Loaded from JSON; every field has a default so an empty object is valid.

use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::error::ComputeError;

/// Default number of days shown on each chart
pub const DEFAULT_LOOKBACK_DAYS: u32 = 28;

/// Weight differentials look one day further back so the first charted day has a predecessor
pub const DEFAULT_WEIGHT_DIFF_LOOKBACK_DAYS: u32 = DEFAULT_LOOKBACK_DAYS + 1;

/// Longest window either lookback may span (about a century)
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Local offset east of UTC used for day and weekday boundaries
    pub utc_offset_minutes: i32,
    pub lookback_days: u32,
    pub weight_diff_lookback_days: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            weight_diff_lookback_days: DEFAULT_WEIGHT_DIFF_LOOKBACK_DAYS,
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a configuration document
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        self.calendar()?;

        if self.lookback_days == 0 {
            return Err(ComputeError::InvalidConfig(
                "lookback_days must be at least 1".to_string(),
            ));
        }
        if self.weight_diff_lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ComputeError::InvalidConfig(format!(
                "weight_diff_lookback_days ({}) exceeds {} days",
                self.weight_diff_lookback_days, MAX_LOOKBACK_DAYS
            )));
        }
        if self.weight_diff_lookback_days < self.lookback_days {
            return Err(ComputeError::InvalidConfig(format!(
                "weight_diff_lookback_days ({}) must not be shorter than lookback_days ({})",
                self.weight_diff_lookback_days, self.lookback_days
            )));
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<Calendar, ComputeError> {
        Calendar::with_offset_minutes(self.utc_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.lookback_days, 28);
        assert_eq!(config.weight_diff_lookback_days, 29);
    }

    #[test]
    fn test_partial_override() {
        let config = DashboardConfig::from_json(r#"{"utc_offset_minutes": -300}"#).unwrap();
        assert_eq!(config.utc_offset_minutes, -300);
        assert_eq!(config.lookback_days, 28);
        assert_eq!(config.calendar().unwrap().offset().local_minus_utc(), -18_000);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            DashboardConfig::from_json(r#"{"lookback_days": 0}"#),
            Err(ComputeError::InvalidConfig(_))
        ));
        assert!(matches!(
            DashboardConfig::from_json(r#"{"lookback_days": 30, "weight_diff_lookback_days": 7}"#),
            Err(ComputeError::InvalidConfig(_))
        ));
        assert!(matches!(
            DashboardConfig::from_json(r#"{"utc_offset_minutes": 2000}"#),
            Err(ComputeError::InvalidTimezone(_))
        ));
        assert!(matches!(
            DashboardConfig::from_json("not json"),
            Err(ComputeError::JsonError(_))
        ));
    }

    #[test]
    fn test_rejects_lookback_past_limit() {
        let err = DashboardConfig::from_json(
            r#"{"lookback_days": 4000000000, "weight_diff_lookback_days": 4000000000}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ComputeError::InvalidConfig(_)));

        assert!(matches!(
            DashboardConfig::from_json(r#"{"lookback_days": 28, "weight_diff_lookback_days": 36501}"#),
            Err(ComputeError::InvalidConfig(_))
        ));

        let widest = DashboardConfig {
            lookback_days: MAX_LOOKBACK_DAYS,
            weight_diff_lookback_days: MAX_LOOKBACK_DAYS,
            ..DashboardConfig::default()
        };
        assert!(widest.validate().is_ok());
    }
}
