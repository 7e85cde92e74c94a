//! Outlier flags for plain samples.
//!
//! Both detectors return a mask aligned with the input: `true` marks an
//! outlier.

use tracing::debug;

use crate::{
    IndicatorError,
    error::require_finite,
    stats::{mean, quantile, sorted},
};

/// Fence multiplier applied to the interquartile range.
pub const IQR_FENCE: f64 = 1.5;

/// Default threshold for [`z_score_outliers`].
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Flags values outside `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`.
///
/// Quartiles are linear-interpolated (see [`quantile`]).
///
/// # Errors
///
/// [`IndicatorError::EmptySeries`] for an empty sample,
/// [`IndicatorError::NonFiniteValue`] for NaN or infinite values.
///
/// # Example
///
/// ```
/// use marketlens_ta::iqr_outliers;
///
/// let flags = iqr_outliers(&[10.0, 11.0, 12.0, 11.0, 10.0, 95.0])?;
/// assert_eq!(flags, [false, false, false, false, false, true]);
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn iqr_outliers(values: &[f64]) -> Result<Vec<bool>, IndicatorError> {
    require_finite(values)?;

    let sorted = sorted(values);
    let (q1, q3) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75));
    let iqr = q3 - q1;
    let (lower, upper) = (IQR_FENCE.mul_add(-iqr, q1), IQR_FENCE.mul_add(iqr, q3));
    debug!(q1, q3, lower, upper, "iqr fences");

    Ok(values.iter().map(|&v| v < lower || v > upper).collect())
}

/// Flags values whose absolute z-score exceeds `threshold`.
///
/// The z-score uses the population standard deviation. A sample without
/// spread flags nothing.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] if `threshold` is not a positive
/// finite number, [`IndicatorError::EmptySeries`] for an empty sample,
/// [`IndicatorError::NonFiniteValue`] for NaN or infinite values.
///
/// # Example
///
/// ```
/// use marketlens_ta::z_score_outliers;
///
/// let flags = z_score_outliers(&[1.0, 1.0, 1.0, 1.0, 9.0], 1.5)?;
/// assert_eq!(flags, [false, false, false, false, true]);
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn z_score_outliers(values: &[f64], threshold: f64) -> Result<Vec<bool>, IndicatorError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(IndicatorError::invalid(
            "threshold",
            format!("must be a positive finite number, got {threshold}"),
        ));
    }
    require_finite(values)?;

    let mean = mean(values);
    let variance = population_variance(values, mean);
    if variance == 0.0 {
        return Ok(vec![false; values.len()]);
    }
    let std = variance.sqrt();
    debug!(mean, std, threshold, "z-score parameters");

    Ok(values
        .iter()
        .map(|v| ((v - mean) / std).abs() > threshold)
        .collect())
}

fn population_variance(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).powi(2)).collect();
    mean(&deviations)
}
