//! Transformations that derive a new series from an existing one.
//!
//! Nothing here mutates its input.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{IndicatorError, IndicatorSeries, Price, PriceSeries};

/// Close-to-close percentage change: `(close[i] / close[i − 1] − 1) × 100`.
///
/// Undefined at index 0 and wherever the previous close is zero.
///
/// # Errors
///
/// [`IndicatorError::EmptySeries`] for an empty series.
///
/// # Example
///
/// ```
/// use marketlens_ta::{PriceSeries, percent_change};
///
/// let series = PriceSeries::from_closes(&[100.0, 110.0, 99.0])?;
/// let returns = percent_change(&series)?;
///
/// assert_eq!(returns.get(0), None);
/// assert!((returns.get(1).unwrap() - 10.0).abs() < 1e-9);
/// assert!((returns.get(2).unwrap() + 10.0).abs() < 1e-9);
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn percent_change(series: &PriceSeries) -> Result<IndicatorSeries, IndicatorError> {
    series.require_non_empty()?;
    debug!(len = series.len(), "computing percent change");

    let closes = series.closes();
    let values = std::iter::once(None)
        .chain(closes.windows(2).map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            (previous != 0.0).then(|| (current / previous - 1.0) * 100.0)
        }))
        .collect();

    Ok(IndicatorSeries::new(
        "PCT_CHANGE(Close)",
        series.timestamps(),
        values,
    ))
}

/// How [`fill_missing`] replaces gaps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "method", content = "value")]
pub enum FillMethod {
    /// Carry the last defined value forward. Leading gaps stay empty.
    Forward,
    /// Pull the next defined value backward. Trailing gaps stay empty.
    Backward,
    /// Mean of the defined values.
    Mean,
    /// A fixed value.
    Value(f64),
}

/// Returns a copy of `values` with gaps filled per `method`.
///
/// Defined entries are never changed. An input without any defined entry
/// comes back unchanged for every method except [`FillMethod::Value`].
///
/// # Example
///
/// ```
/// use marketlens_ta::{FillMethod, fill_missing};
///
/// let values = [None, Some(1.0), None, Some(3.0), None];
///
/// assert_eq!(
///     fill_missing(&values, FillMethod::Forward),
///     vec![None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)],
/// );
/// assert_eq!(
///     fill_missing(&values, FillMethod::Mean),
///     vec![Some(2.0), Some(1.0), Some(2.0), Some(3.0), Some(2.0)],
/// );
/// ```
#[must_use]
pub fn fill_missing(values: &[Option<Price>], method: FillMethod) -> Vec<Option<Price>> {
    match method {
        FillMethod::Forward => carry(values.iter().copied()),
        FillMethod::Backward => {
            let mut filled = carry(values.iter().rev().copied());
            filled.reverse();
            filled
        }
        FillMethod::Mean => {
            let defined: Vec<f64> = values.iter().flatten().copied().collect();
            if defined.is_empty() {
                return values.to_vec();
            }
            #[allow(clippy::cast_precision_loss)]
            let mean = defined.iter().sum::<f64>() / defined.len() as f64;
            values.iter().map(|v| Some(v.unwrap_or(mean))).collect()
        }
        FillMethod::Value(fill) => values.iter().map(|v| Some(v.unwrap_or(fill))).collect(),
    }
}

fn carry(values: impl Iterator<Item = Option<Price>>) -> Vec<Option<Price>> {
    let mut last = None;
    values
        .map(|v| {
            if v.is_some() {
                last = v;
            }
            last
        })
        .collect()
}
