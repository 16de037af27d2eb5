//! Summary statistics over non-negative quantity series
//!
//! Thin wrappers around `statrs` that turn its NaN-on-empty convention into
//! explicit errors.

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Arithmetic mean of a series
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "cannot take the mean of an empty series".to_string(),
        ));
    }

    let m = Statistics::mean(values.iter());
    if !m.is_finite() {
        return Err(MathError::CalculationError(format!(
            "mean is not finite ({})",
            m
        )));
    }

    Ok(m)
}

/// Mean of a series, or 0.0 when it is empty
pub fn mean_or_zero(values: &[f64]) -> f64 {
    mean(values).unwrap_or(0.0)
}

/// Largest value of a series
pub fn max_value(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "cannot take the maximum of an empty series".to_string(),
        ));
    }

    let m = Statistics::max(values.iter());
    if m.is_nan() {
        return Err(MathError::CalculationError(
            "series contains NaN values".to_string(),
        ));
    }

    Ok(m)
}

/// Ratio that brings `value` down to `cap`.
///
/// Returns 1.0 when no scaling is needed (value within the cap, or a
/// non-positive value or cap).
pub fn clamp_ratio(value: f64, cap: f64) -> f64 {
    if value > cap && value > 0.0 && cap > 0.0 {
        cap / value
    } else {
        1.0
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
        assert!(matches!(mean(&[]), Err(MathError::InsufficientData(_))));
        assert_eq!(mean_or_zero(&[]), 0.0);
    }

    #[test]
    fn test_max_value() {
        assert_relative_eq!(max_value(&[3.0, 9.5, 1.0]).unwrap(), 9.5);
        assert!(max_value(&[]).is_err());
        assert!(max_value(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_clamp_ratio() {
        assert_relative_eq!(clamp_ratio(30.0, 10.0), 1.0 / 3.0);
        assert_eq!(clamp_ratio(5.0, 10.0), 1.0);
        assert_eq!(clamp_ratio(0.0, 10.0), 1.0);
        assert_eq!(clamp_ratio(5.0, 0.0), 1.0);
    }

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(12.34567, 2), 12.35);
        assert_relative_eq!(round_to(0.123456, 4), 0.1235);
    }
}
