//! Batch indicator computation over a whole [`PriceSeries`].
//!
//! Every function here is pure: it borrows the input, validates parameters
//! before doing any work, and returns new series of the input's length.
//! Positions without enough history are `None`, never errors.
//!
//! Observations are fed to the streaming indicators addressed by their
//! position, so two observations sharing a timestamp are still two bars.

use std::num::NonZero;

use tracing::{debug, trace, warn};

use crate::{
    Ema, EmaConfig, Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorError,
    IndicatorSeries, Macd, MacdConfig, MacdSeries, Price, PriceSeries, Rsi, RsiConfig,
    RsiSmoothing, Sma, SmaConfig, Timestamp,
    error::require_finite,
    ohlcv::{Point, Sequenced},
};

fn non_zero(name: &'static str, period: usize) -> Result<NonZero<usize>, IndicatorError> {
    NonZero::new(period).ok_or_else(|| IndicatorError::invalid(name, "must be positive"))
}

fn run<I>(mut indicator: I, series: &PriceSeries) -> Vec<Option<I::Output>>
where
    I: Indicator,
{
    let values: Vec<_> = series
        .iter()
        .enumerate()
        .map(|(index, bar)| indicator.compute(&Sequenced { bar, index }))
        .collect();
    trace!(
        first_defined = values.iter().position(Option::is_some),
        len = values.len(),
        "indicator run finished"
    );
    values
}

/// `true` when no position of `series` can have `lookback` bars of history,
/// in which case the caller returns an all-undefined result without
/// running the indicator.
fn exceeds_series(name: &str, lookback: usize, series: &PriceSeries) -> bool {
    let short = lookback > series.len();
    if short {
        warn!(
            indicator = name,
            lookback,
            len = series.len(),
            "series shorter than lookback, every value is undefined"
        );
    }
    short
}

fn undefined(name: impl Into<String>, series: &PriceSeries) -> IndicatorSeries {
    IndicatorSeries::new(name, series.timestamps(), vec![None; series.len()])
}

/// Simple moving average of the close.
///
/// The first `period − 1` entries are undefined; entry `i` after that is
/// the mean of `close[i − period + 1 ..= i]`. A `period` longer than the
/// series yields an all-undefined result.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] for `period == 0`,
/// [`IndicatorError::EmptySeries`] for an empty series.
///
/// # Example
///
/// ```
/// use marketlens_ta::{PriceSeries, moving_average};
///
/// let closes: Vec<f64> = (10..=20).map(f64::from).collect();
/// let series = PriceSeries::from_closes(&closes)?;
/// let sma = moving_average(&series, 5)?;
///
/// assert_eq!(sma.leading_undefined(), 4);
/// assert!((sma.get(4).unwrap() - 12.0).abs() < 1e-12);
/// assert!((sma.get(9).unwrap() - 17.0).abs() < 1e-12);
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn moving_average(
    series: &PriceSeries,
    period: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let sma = Sma::new(SmaConfig::try_close(period)?);
    series.require_non_empty()?;

    let name = sma.to_string();
    debug!(indicator = %name, len = series.len(), "computing moving average");
    if exceeds_series(&name, sma.config().lookback(), series) {
        return Ok(undefined(name, series));
    }

    Ok(IndicatorSeries::new(name, series.timestamps(), run(sma, series)))
}

/// Exponential moving average of raw values.
///
/// `alpha = 2 / (span + 1)`, `ema[0] = values[0]`, then
/// `ema[i] = alpha × values[i] + (1 − alpha) × ema[i − 1]`. Every entry is
/// defined.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] for `span == 0`,
/// [`IndicatorError::EmptySeries`] for empty input and
/// [`IndicatorError::NonFiniteValue`] for NaN or infinite values.
///
/// # Example
///
/// ```
/// use marketlens_ta::ema;
///
/// let values = ema(&[2.0, 4.0, 6.0], 3)?;
/// assert_eq!(values, vec![2.0, 3.0, 4.5]);
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn ema(values: &[Price], span: usize) -> Result<Vec<Price>, IndicatorError> {
    let length = non_zero("span", span)?;
    require_finite(values)?;

    let mut ema = Ema::new(EmaConfig::close(length));
    debug!(indicator = %ema, len = values.len(), "computing exponential moving average");

    Ok(values
        .iter()
        .zip(0..)
        .map(|(&value, open_time): (&Price, Timestamp)| {
            let point = Point { value, open_time };
            // `EmaConfig::close` does not enforce convergence, so every
            // point yields a value; the fallback is never taken.
            ema.compute(&point).unwrap_or(value)
        })
        .collect())
}

/// Exponential moving average of the close as an [`IndicatorSeries`].
///
/// Same recurrence as [`ema`]; defined at every index.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] for `span == 0`,
/// [`IndicatorError::EmptySeries`] for an empty series.
pub fn exponential_moving_average(
    series: &PriceSeries,
    span: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let length = non_zero("span", span)?;
    series.require_non_empty()?;

    let indicator = Ema::new(EmaConfig::close(length));
    let name = indicator.to_string();
    debug!(indicator = %name, len = series.len(), "computing exponential moving average");

    Ok(IndicatorSeries::new(name, series.timestamps(), run(indicator, series)))
}

/// Relative strength index of the close with Wilder's smoothing.
///
/// See [`relative_strength_index_with`].
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] for `period == 0`,
/// [`IndicatorError::EmptySeries`] for an empty series.
pub fn relative_strength_index(
    series: &PriceSeries,
    period: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    relative_strength_index_with(series, period, RsiSmoothing::Wilder)
}

/// Relative strength index of the close with the given smoothing.
///
/// The first `period` entries are undefined (RSI needs `period` price
/// changes). Defined values lie in `[0, 100]`: only gains in the window
/// give 100, only losses give 0, and a window without movement stays
/// undefined.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] for `period == 0`,
/// [`IndicatorError::EmptySeries`] for an empty series.
///
/// # Example
///
/// ```
/// use marketlens_ta::{PriceSeries, RsiSmoothing, relative_strength_index_with};
///
/// let closes: Vec<f64> = (0..15).map(f64::from).collect();
/// let series = PriceSeries::from_closes(&closes)?;
/// let rsi = relative_strength_index_with(&series, 14, RsiSmoothing::Simple)?;
///
/// assert_eq!(rsi.leading_undefined(), 14);
/// assert_eq!(rsi.get(14), Some(100.0));
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn relative_strength_index_with(
    series: &PriceSeries,
    period: usize,
    smoothing: RsiSmoothing,
) -> Result<IndicatorSeries, IndicatorError> {
    let length = non_zero("period", period)?;
    series.require_non_empty()?;

    let rsi = Rsi::new(
        RsiConfig::builder()
            .length(length)
            .smoothing(smoothing)
            .build(),
    );
    let name = rsi.to_string();
    debug!(indicator = %name, len = series.len(), "computing relative strength index");
    if exceeds_series(&name, rsi.config().lookback(), series) {
        return Ok(undefined(name, series));
    }

    Ok(IndicatorSeries::new(name, series.timestamps(), run(rsi, series)))
}

/// MACD line, signal line and histogram of the close.
///
/// All EMAs are seeded with their first input. The MACD line is undefined
/// for the first `slow − 1` entries, the signal line and histogram for the
/// first `slow + signal − 2`. Where defined, the histogram is exactly
/// `macd − signal`.
///
/// # Errors
///
/// [`IndicatorError::InvalidParameter`] for a zero span or
/// `fast >= slow`, [`IndicatorError::EmptySeries`] for an empty series.
///
/// # Example
///
/// ```
/// use marketlens_ta::{PriceSeries, macd};
///
/// let series = PriceSeries::from_closes(&[50.0; 40])?;
/// let result = macd(&series, 12, 26, 9)?;
///
/// assert_eq!(result.macd.leading_undefined(), 25);
/// assert_eq!(result.histogram.leading_undefined(), 33);
/// assert!(result.histogram.defined().all(|(_, h)| h == 0.0));
///
/// assert!(macd(&series, 26, 12, 9).is_err());
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
pub fn macd(
    series: &PriceSeries,
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<MacdSeries, IndicatorError> {
    macd_with(series, MacdConfig::try_new(fast, slow, signal)?)
}

/// [`macd`] with the conventional 12 / 26 / 9 spans.
///
/// # Errors
///
/// [`IndicatorError::EmptySeries`] for an empty series.
pub fn macd_default(series: &PriceSeries) -> Result<MacdSeries, IndicatorError> {
    macd_with(series, MacdConfig::default())
}

pub(crate) fn macd_with(
    series: &PriceSeries,
    config: MacdConfig,
) -> Result<MacdSeries, IndicatorError> {
    series.require_non_empty()?;

    let indicator = Macd::new(config);
    let name = indicator.to_string();
    debug!(indicator = %name, len = series.len(), "computing MACD");
    if exceeds_series(&name, config.lookback(), series) {
        return Ok(MacdSeries {
            macd: undefined(format!("{name} line"), series),
            signal: undefined(format!("{name} signal"), series),
            histogram: undefined(format!("{name} histogram"), series),
        });
    }

    let values = run(indicator, series);
    let timestamps = series.timestamps();
    let column = |label: &str, pick: fn(&crate::MacdValue) -> Option<Price>| {
        IndicatorSeries::new(
            format!("{name} {label}"),
            timestamps.clone(),
            values.iter().map(|v| v.as_ref().and_then(pick)).collect(),
        )
    };

    Ok(MacdSeries {
        macd: column("line", |v| Some(v.macd())),
        signal: column("signal", crate::MacdValue::signal),
        histogram: column("histogram", crate::MacdValue::histogram),
    })
}
