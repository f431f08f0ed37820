//! Validation of user-entered metric values

use crate::error::HealthStoreError;
use crate::types::HealthMetricKind;

/// Parse a value typed into an "add data" form.
///
/// Accepts plain decimal numbers (digits and at most one `.`) with at most one
/// decimal place. Step counts must be whole numbers. Signs, exponents and
/// named values such as `inf` are rejected.
pub fn parse_metric_value(kind: HealthMetricKind, raw: &str) -> Result<f64, HealthStoreError> {
    let raw = raw.trim();

    if !raw.chars().any(|c| c.is_ascii_digit())
        || !raw.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return Err(HealthStoreError::InvalidInput);
    }

    let decimals = raw.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    let max_decimals = match kind {
        HealthMetricKind::Steps => 0,
        _ => 1,
    };
    if decimals > max_decimals {
        return Err(HealthStoreError::InvalidInput);
    }

    let value: f64 = raw.parse().map_err(|_| HealthStoreError::InvalidInput)?;
    if !value.is_finite() || value < 0.0 {
        return Err(HealthStoreError::InvalidInput);
    }

    Ok(value)
}
