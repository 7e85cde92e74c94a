use std::{fmt::Display, num::NonZero};

use crate::{
    Ema, EmaConfig, Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorError, Ohlcv,
    Price, PriceSource, Timestamp, error::require_period, ohlcv::Point,
};

const DEFAULT_FAST: usize = 12;
const DEFAULT_SLOW: usize = 26;
const DEFAULT_SIGNAL: usize = 9;

/// Configuration for the [`Macd`] indicator.
///
/// Holds the fast and slow EMA spans and the signal EMA span. The fast span
/// must be strictly shorter than the slow one. [`IndicatorConfig::length`]
/// reports the slow span, which is what the MACD line needs before it is
/// reported.
///
/// # Example
///
/// ```
/// use marketlens_ta::MacdConfig;
///
/// let config = MacdConfig::default();
/// assert_eq!((config.fast(), config.slow(), config.signal()), (12, 26, 9));
///
/// assert!(MacdConfig::try_new(26, 12, 9).is_err());
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MacdConfig {
    fast: usize,
    slow: usize,
    signal: usize,
    source: PriceSource,
}

impl IndicatorConfig for MacdConfig {
    type Builder = MacdConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        MacdConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.slow
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    /// Bars before the MACD line is reported. The signal line needs
    /// [`required_bars_for_signal`](Self::required_bars_for_signal).
    #[inline]
    fn lookback(&self) -> usize {
        self.slow
    }
}

impl MacdConfig {
    /// Validated MACD on closing price.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::InvalidParameter`] if any span is zero or
    /// `fast >= slow`.
    pub fn try_new(fast: usize, slow: usize, signal: usize) -> Result<Self, IndicatorError> {
        require_period("fast", fast)?;
        require_period("slow", slow)?;
        require_period("signal", signal)?;
        if fast >= slow {
            return Err(IndicatorError::invalid(
                "fast",
                format!("fast span {fast} must be shorter than slow span {slow}"),
            ));
        }

        Ok(Self {
            fast,
            slow,
            signal,
            source: PriceSource::Close,
        })
    }

    #[inline]
    #[must_use]
    pub fn fast(&self) -> usize {
        self.fast
    }

    #[inline]
    #[must_use]
    pub fn slow(&self) -> usize {
        self.slow
    }

    #[inline]
    #[must_use]
    pub fn signal(&self) -> usize {
        self.signal
    }

    /// Bars before the signal line and histogram are reported:
    /// `slow + signal − 1`, saturating at `usize::MAX`.
    #[inline]
    #[must_use]
    pub fn required_bars_for_signal(&self) -> usize {
        (self.slow - 1).saturating_add(self.signal)
    }
}

impl Default for MacdConfig {
    /// MACD(12, 26, 9) on closing price.
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Display for MacdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MacdConfig({}, {}, {}, {})",
            self.fast, self.slow, self.signal, self.source
        )
    }
}

/// Builder for [`MacdConfig`].
///
/// Defaults: fast = 12, slow = 26, signal = 9,
/// source = [`PriceSource::Close`]. [`length`](IndicatorConfigBuilder::length)
/// sets the slow span.
pub struct MacdConfigBuilder {
    fast: usize,
    slow: usize,
    signal: usize,
    source: PriceSource,
}

impl MacdConfigBuilder {
    fn new() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
            source: PriceSource::Close,
        }
    }

    #[inline]
    #[must_use]
    pub fn fast(mut self, fast: NonZero<usize>) -> Self {
        self.fast = fast.get();
        self
    }

    #[inline]
    #[must_use]
    pub fn signal(mut self, signal: NonZero<usize>) -> Self {
        self.signal = signal.get();
        self
    }
}

impl IndicatorConfigBuilder<MacdConfig> for MacdConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.slow = length.get();
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    /// Panics if `fast >= slow`; use [`MacdConfig::try_new`] for untrusted
    /// input.
    #[inline]
    fn build(self) -> MacdConfig {
        assert!(
            self.fast < self.slow,
            "fast span must be shorter than slow span: fast={}, slow={}",
            self.fast,
            self.slow
        );

        MacdConfig {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
            source: self.source,
        }
    }
}

/// MACD output: MACD line, signal line and histogram.
///
/// ```text
/// macd      = EMA(fast) − EMA(slow)
/// signal    = EMA(macd, signal)
/// histogram = macd − signal
/// ```
///
/// The signal line and histogram stay `None` until
/// [`required_bars_for_signal`](MacdConfig::required_bars_for_signal) bars
/// have been seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    macd: Price,
    signal: Option<Price>,
    histogram: Option<Price>,
}

impl MacdValue {
    #[inline]
    #[must_use]
    pub fn macd(&self) -> Price {
        self.macd
    }

    #[inline]
    #[must_use]
    pub fn signal(&self) -> Option<Price> {
        self.signal
    }

    /// `macd − signal`, exactly.
    #[inline]
    #[must_use]
    pub fn histogram(&self) -> Option<Price> {
        self.histogram
    }
}

impl Display for MacdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MACD(m: {}", self.macd)?;
        if let (Some(signal), Some(histogram)) = (self.signal, self.histogram) {
            write!(f, ", s: {signal}, h: {histogram}")?;
        }
        write!(f, ")")
    }
}

/// Moving Average Convergence Divergence (MACD).
///
/// Difference between a fast and a slow [`Ema`] of the configured price,
/// with an EMA of that difference as the signal line. All three EMAs are
/// seeded with their first input and run from the very first bar; output is
/// withheld until the slow EMA has seen `slow` bars, and the signal line
/// until `slow + signal − 1` bars.
///
/// Feeding a bar with the same `open_time` repaints all three EMAs.
///
/// # Example
///
/// ```
/// use marketlens_ta::{Macd, MacdConfig};
/// # use marketlens_ta::{Ohlcv, Price, Timestamp};
/// #
/// # struct Bar(f64, u64);
/// # impl Ohlcv for Bar {
/// #     fn close(&self) -> Price { self.0 }
/// #     fn open_time(&self) -> Timestamp { self.1 }
/// # }
///
/// let mut macd = Macd::new(MacdConfig::try_new(2, 3, 2).unwrap());
///
/// assert!(macd.compute(&Bar(10.0, 1)).is_none());
/// assert!(macd.compute(&Bar(10.0, 2)).is_none());
///
/// let value = macd.compute(&Bar(10.0, 3)).unwrap();
/// assert_eq!(value.macd(), 0.0);
/// assert_eq!(value.histogram(), None);
///
/// let value = macd.compute(&Bar(10.0, 4)).unwrap();
/// assert_eq!(value.histogram(), Some(0.0));
/// ```
#[derive(Clone, Debug)]
pub struct Macd {
    config: MacdConfig,
    fast: Ema,
    slow: Ema,
    signal: Ema,
    seen_bars: usize,
    last_open_time: Option<Timestamp>,
    current: Option<MacdValue>,
}

impl Indicator for Macd {
    type Config = MacdConfig;
    type Output = MacdValue;

    fn new(config: Self::Config) -> Self {
        let ema = |span: usize, source: PriceSource| {
            let length = NonZero::new(span).expect("MacdConfig spans are non-zero");
            Ema::new(EmaConfig::builder().length(length).source(source).build())
        };

        Self {
            config,
            fast: ema(config.fast, config.source),
            slow: ema(config.slow, config.source),
            signal: ema(config.signal, PriceSource::Close),
            seen_bars: 0,
            last_open_time: None,
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<MacdValue> {
        if self.last_open_time.is_none_or(|t| t < ohlcv.open_time()) {
            self.last_open_time = Some(ohlcv.open_time());
            self.seen_bars += 1;
        }

        let (Some(fast), Some(slow)) = (self.fast.compute(ohlcv), self.slow.compute(ohlcv)) else {
            return None;
        };

        let macd = fast - slow;
        let signal = self.signal.compute(&Point {
            value: macd,
            open_time: ohlcv.open_time(),
        });

        self.current = (self.seen_bars >= self.config.slow).then(|| {
            let signal =
                signal.filter(|_| self.seen_bars >= self.config.required_bars_for_signal());
            MacdValue {
                macd,
                signal,
                histogram: signal.map(|signal| macd - signal),
            }
        });

        self.current
    }

    #[inline]
    fn value(&self) -> Option<MacdValue> {
        self.current
    }

    #[inline]
    fn config(&self) -> &MacdConfig {
        &self.config
    }
}

impl Display for Macd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({}, {}, {}, {})",
            self.config.fast, self.config.slow, self.config.signal, self.config.source
        )
    }
}
