use crate::{Ohlcv, PriceSource};

use std::{
    fmt::{Debug, Display},
    hash::Hash,
    num::NonZero,
};

/// Parameters of an [`Indicator`].
///
/// Lengths are taken as [`NonZero`] by the builders, so a config that
/// exists is always usable. Raw `usize` periods coming from a caller or a
/// settings file are checked by the batch functions (or by fallible
/// constructors such as [`MacdConfig::try_new`](crate::MacdConfig::try_new))
/// before a config is built.
pub trait IndicatorConfig: Sized + PartialEq + Eq + Hash + Display + Debug {
    type Builder: IndicatorConfigBuilder<Self>;

    fn builder() -> Self::Builder;

    /// Primary window length in bars. MACD reports its slow span.
    fn length(&self) -> usize;

    fn source(&self) -> &PriceSource;

    /// Number of bars an indicator built from this config consumes before
    /// its first `Some`.
    ///
    /// Over a series of `n` bars the first defined position is
    /// `lookback − 1`; when `lookback > n` nothing is defined. Saturates at
    /// `usize::MAX` for lengths near the top of the range.
    fn lookback(&self) -> usize;
}

/// Builder for an [`IndicatorConfig`].
///
/// `length` has no default and [`build`](Self::build) panics without it.
pub trait IndicatorConfigBuilder<Config>
where
    Config: IndicatorConfig,
{
    #[must_use]
    fn length(self, length: NonZero<usize>) -> Self;

    #[must_use]
    fn source(self, source: PriceSource) -> Self;

    #[must_use]
    fn build(self) -> Config;
}

/// An indicator fed one bar at a time.
///
/// The same implementations back both entry points of the crate:
///
/// - live use, where bars arrive with real `open_time`s and a bar whose
///   `open_time` equals the previous one replaces it (repaint);
/// - the batch functions such as [`moving_average`](crate::moving_average),
///   which feed a [`PriceSeries`](crate::PriceSeries) with each
///   observation's position as its `open_time`, so duplicate timestamps in
///   the data never collapse into a repaint.
///
/// Output is `None` while the indicator lacks history
/// ([`IndicatorConfig::lookback`] bars), and for indicators like RSI also
/// where the value is undefined for the current window.
///
/// # Example
///
/// Generic code over any indicator:
///
/// ```
/// use marketlens_ta::{Indicator, Ohlcv, Price, Rsi, RsiConfig, Sma, SmaConfig, Timestamp};
/// use std::num::NonZero;
///
/// struct Close(f64, u64);
/// impl Ohlcv for Close {
///     fn close(&self) -> Price { self.0 }
///     fn open_time(&self) -> Timestamp { self.1 }
/// }
///
/// fn last<I: Indicator>(config: I::Config, closes: &[f64]) -> Option<I::Output> {
///     let mut indicator = I::new(config);
///     for (&close, position) in closes.iter().zip(0..) {
///         indicator.compute(&Close(close, position));
///     }
///     indicator.value()
/// }
///
/// let three = NonZero::new(3).unwrap();
/// assert_eq!(last::<Sma>(SmaConfig::close(three), &[1.0, 2.0, 6.0]), Some(3.0));
/// assert_eq!(last::<Rsi>(RsiConfig::close(three), &[1.0, 2.0, 6.0]), None);
/// assert_eq!(last::<Rsi>(RsiConfig::close(three), &[1.0, 2.0, 6.0, 7.0]), Some(100.0));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug {
    type Config: IndicatorConfig;

    /// `f64` for single-line indicators, [`MacdValue`](crate::MacdValue)
    /// for MACD.
    type Output: Send + Sync + Display + Debug;

    fn new(config: Self::Config) -> Self;

    /// Consumes `bar` (a new bar, or a repaint of the current one) and
    /// returns the value at that bar.
    ///
    /// `open_time` must not decrease between calls.
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Self::Output>;

    /// The value returned by the last [`compute`](Self::compute).
    fn value(&self) -> Option<Self::Output>;

    fn config(&self) -> &Self::Config;
}
