//! Descriptive statistics over plain samples.

use serde::Serialize;

use crate::{IndicatorError, error::require_finite};

/// Linear-interpolated quantile of an ascending, non-empty sample.
///
/// `q` is clamped to `[0, 1]`. Position `q × (n − 1)` is interpolated
/// between its two neighbours.
///
/// # Panics
///
/// Panics if `sorted` is empty.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    assert!(!sorted.is_empty(), "quantile of an empty sample");

    #[allow(clippy::cast_precision_loss)]
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let fraction = position - lower as f64;

    (sorted[upper] - sorted[lower]).mul_add(fraction, sorted[lower])
}

pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Count, mean, spread and quartiles of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (`n − 1` denominator); `None` for a single
    /// value.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    /// Summarises `values`.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::EmptySeries`] for an empty sample,
    /// [`IndicatorError::NonFiniteValue`] for NaN or infinite values.
    ///
    /// # Example
    ///
    /// ```
    /// use marketlens_ta::Summary;
    ///
    /// let summary = Summary::of(&[1.0, 2.0, 3.0, 4.0])?;
    /// assert_eq!(summary.median, 2.5);
    /// assert_eq!((summary.q1, summary.q3), (1.75, 3.25));
    /// # Ok::<(), marketlens_ta::IndicatorError>(())
    /// ```
    pub fn of(values: &[f64]) -> Result<Self, IndicatorError> {
        require_finite(values)?;

        let sorted = sorted(values);
        let mean = mean(values);
        let std = (values.len() > 1).then(|| {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            #[allow(clippy::cast_precision_loss)]
            let denominator = (values.len() - 1) as f64;
            (squares / denominator).sqrt()
        });

        Ok(Self {
            count: values.len(),
            mean,
            std,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    /// Summarises the defined entries of an aligned series.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::EmptySeries`] when nothing is defined.
    pub fn of_defined(values: &[Option<f64>]) -> Result<Self, IndicatorError> {
        let defined: Vec<f64> = values.iter().flatten().copied().collect();
        Self::of(&defined)
    }
}

/// Pearson correlation of two aligned series, over the positions where both
/// are defined.
///
/// Returns `Ok(None)` when fewer than two such positions exist or either
/// side has no variance.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] when the lengths differ.
///
/// # Example
///
/// ```
/// use marketlens_ta::pearson_correlation;
///
/// let returns = [None, Some(1.0), Some(-2.0), Some(3.0)];
/// let sentiment = [Some(0.1), Some(0.2), Some(-0.4), Some(0.6)];
///
/// let r = pearson_correlation(&returns, &sentiment)?.unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn pearson_correlation(
    a: &[Option<f64>],
    b: &[Option<f64>],
) -> Result<Option<f64>, IndicatorError> {
    if a.len() != b.len() {
        return Err(IndicatorError::invalid(
            "b",
            format!("length {} differs from {}", b.len(), a.len()),
        ));
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| x.zip(*y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip();

    if xs.len() < 2 {
        return Ok(None);
    }

    let (mean_x, mean_y) = (mean(&xs), mean(&ys));
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(&ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Ok(None);
    }

    Ok(Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)))
}
