use std::{
    fmt::{Debug, Display},
    num::NonZero,
};

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource, Timestamp,
};

/// Configuration for the Exponential Moving Average ([`Ema`])
/// indicator.
///
/// # Convergence
///
/// EMA has infinite memory: the seed (the first bar's price) influences
/// all subsequent values. With `enforce_convergence` enabled,
/// [`Ema::compute`] returns `None` until the seed's contribution decays
/// below 1%, which for EMA(20) is 63 bars (`3 × (length + 1)`).
/// Without enforcement, a value is returned from the very first bar.
///
/// # Example
///
/// ```
/// use marketlens_ta::{EmaConfig, IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = EmaConfig::builder()
///     .length(NonZero::new(20).unwrap())
///     .enforce_convergence(true)
///     .build();
///
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.required_bars_to_converge(), 63);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: usize,
    source: PriceSource,
    convergence: bool,
    bars_to_converge: usize,
}

impl IndicatorConfig for EmaConfig {
    type Builder = EmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        EmaConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    /// Same as [`required_bars_to_converge`](EmaConfig::required_bars_to_converge).
    #[inline]
    fn lookback(&self) -> usize {
        self.bars_to_converge
    }
}

impl EmaConfig {
    /// Span of the average (number of bars).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// When `true`, [`Ema::compute`] returns `None` until
    /// [`required_bars_to_converge`](Self::required_bars_to_converge) bars have
    /// been processed. Default: `false`.
    #[inline]
    #[must_use]
    pub fn enforce_convergence(&self) -> bool {
        self.convergence
    }

    /// Number of bars needed before the EMA output is reported.
    ///
    /// `1` when convergence is not enforced, `3 × (length + 1)` otherwise.
    #[must_use]
    pub fn required_bars_to_converge(&self) -> usize {
        self.bars_to_converge
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`EmaConfig`].
///
/// Defaults: source = [`PriceSource::Close`],
/// convergence enforcement = `false`.
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct EmaConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
    convergence: bool,
}

impl EmaConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
            convergence: false,
        }
    }

    /// Enables or disables convergence enforcement.
    #[inline]
    #[must_use]
    pub fn enforce_convergence(mut self, enforce: bool) -> Self {
        self.convergence = enforce;
        self
    }
}

impl IndicatorConfigBuilder<EmaConfig> for EmaConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> EmaConfig {
        let length = self.length.expect("length is required");
        let bars_to_converge = if self.convergence {
            length.saturating_add(1).saturating_mul(3)
        } else {
            1
        };

        EmaConfig {
            length,
            source: self.source,
            convergence: self.convergence,
            bars_to_converge,
        }
    }
}

/// Exponential Moving Average (EMA).
///
/// Weighted moving average with smoothing factor
/// `α = 2 / (length + 1)`, seeded with the first bar's price:
///
/// ```text
/// EMA[0] = price[0]
/// EMA[i] = α × price[i] + (1 − α) × EMA[i − 1]
/// ```
///
/// O(1) memory per tick via a single fused multiply-add. Feeding a bar
/// with the same `open_time` recomputes from the previous bar's EMA
/// without advancing state.
///
/// # Example
///
/// ```
/// use marketlens_ta::{Ema, EmaConfig};
/// use std::num::NonZero;
/// # use marketlens_ta::{Ohlcv, Price, Timestamp};
/// #
/// # struct Bar(f64, u64);
/// # impl Ohlcv for Bar {
/// #     fn close(&self) -> Price { self.0 }
/// #     fn open_time(&self) -> Timestamp { self.1 }
/// # }
///
/// // EMA(3): α = 0.5
/// let mut ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
///
/// assert_eq!(ema.compute(&Bar(2.0, 1)), Some(2.0));
/// assert_eq!(ema.compute(&Bar(4.0, 2)), Some(3.0));
/// assert_eq!(ema.compute(&Bar(6.0, 3)), Some(4.5));
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    config: EmaConfig,
    alpha: f64,
    previous: Option<Price>,
    current: Option<Price>,
    last_open_time: Option<Timestamp>,
    seen_bars: usize,
    converged: bool,
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            #[allow(clippy::cast_precision_loss)]
            alpha: 2.0 / (config.length as f64 + 1.0),
            previous: None,
            current: None,
            last_open_time: None,
            seen_bars: 0,
            converged: false,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Price> {
        debug_assert!(
            self.last_open_time.is_none_or(|t| t <= ohlcv.open_time()),
            "open_time must be non-decreasing: last={}, got={}",
            self.last_open_time.unwrap_or(0),
            ohlcv.open_time(),
        );

        let is_next_bar = self.last_open_time.is_none_or(|t| t < ohlcv.open_time());

        if is_next_bar {
            self.previous = self.current;
            self.last_open_time = Some(ohlcv.open_time());

            if !self.converged {
                self.seen_bars += 1;
                self.converged = self.seen_bars >= self.config.required_bars_to_converge();
            }
        }

        let price = self.config.source.extract(ohlcv);
        self.current = Some(match self.previous {
            Some(previous) => self.alpha.mul_add(price - previous, previous),
            None => price,
        });

        self.value()
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        if self.converged { self.current } else { None }
    }

    #[inline]
    fn config(&self) -> &EmaConfig {
        &self.config
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}, {})", self.config.length, self.config.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, bar, nz};

    fn ema(length: usize) -> Ema {
        Ema::new(EmaConfig::close(nz(length)))
    }

    mod seeding {
        use super::*;

        #[test]
        fn first_value_is_first_price() {
            let mut ema = ema(26);
            assert_eq!(ema.compute(&bar(123.5, 1)), Some(123.5));
        }

        #[test]
        fn repaint_replaces_seed() {
            let mut ema = ema(3);
            ema.compute(&bar(2.0, 1));
            assert_eq!(ema.compute(&bar(5.0, 1)), Some(5.0));
            // 7 × 0.5 + 5 × 0.5
            assert_eq!(ema.compute(&bar(7.0, 2)), Some(6.0));
        }
    }

    mod computation {
        use super::*;

        #[test]
        fn applies_recurrence() {
            // EMA(3): α = 0.5
            let mut ema = ema(3);
            ema.compute(&bar(2.0, 1));
            ema.compute(&bar(4.0, 2)); // 3.0
            ema.compute(&bar(6.0, 3)); // 4.5
            assert_eq!(ema.compute(&bar(8.0, 4)), Some(6.25));
        }

        #[test]
        fn alpha_for_length_four_is_two_fifths() {
            // 10 → 10, then 20 × 0.4 + 10 × 0.6 = 14
            let mut ema = ema(4);
            ema.compute(&bar(10.0, 1));
            assert_approx!(ema.compute(&bar(20.0, 2)).unwrap(), 14.0);
        }

        #[test]
        fn constant_input_stays_constant() {
            let mut ema = ema(12);
            for i in 1..=40 {
                assert_eq!(ema.compute(&bar(50.0, i)), Some(50.0));
            }
        }

        #[test]
        fn maximal_length_stays_finite() {
            let mut ema = ema(usize::MAX);
            ema.compute(&bar(10.0, 1));
            let value = ema.compute(&bar(1e6, 2)).unwrap();
            assert!(value.is_finite());
            assert!((value - 10.0).abs() < 1e-9);
        }

        #[test]
        fn length_one_tracks_latest_price() {
            let mut ema = ema(1);
            ema.compute(&bar(10.0, 1));
            assert_eq!(ema.compute(&bar(20.0, 2)), Some(20.0));
            assert_eq!(ema.compute(&bar(5.0, 3)), Some(5.0));
        }
    }

    mod repaint {
        use super::*;

        #[test]
        fn recomputes_from_previous_bar() {
            let mut ema = ema(3);
            ema.compute(&bar(2.0, 1));
            ema.compute(&bar(4.0, 2)); // 3.0
            // repaint bar 2: 10 × 0.5 + 2 × 0.5
            assert_eq!(ema.compute(&bar(10.0, 2)), Some(6.0));
            // advance from the repainted value: 8 × 0.5 + 6 × 0.5
            assert_eq!(ema.compute(&bar(8.0, 3)), Some(7.0));
        }
    }

    mod convergence {
        use super::*;

        #[test]
        fn none_until_converged_when_enforced() {
            let mut ema = Ema::new(
                EmaConfig::builder()
                    .length(nz(3))
                    .enforce_convergence(true)
                    .build(),
            );
            // 3 × (3 + 1) = 12
            for i in 1..=11 {
                assert_eq!(ema.compute(&bar(50.0, i)), None, "expected None at bar {i}");
            }
            assert_eq!(ema.compute(&bar(50.0, 12)), Some(50.0));
        }

        #[test]
        fn repaints_do_not_count_as_bars() {
            let mut ema = Ema::new(
                EmaConfig::builder()
                    .length(nz(1))
                    .enforce_convergence(true)
                    .build(),
            );
            // 3 × (1 + 1) = 6
            for _ in 0..10 {
                ema.compute(&bar(1.0, 1));
            }
            assert_eq!(ema.value(), None);
        }

        #[test]
        fn required_bars() {
            assert_eq!(EmaConfig::close(nz(10)).required_bars_to_converge(), 1);
            let enforced = EmaConfig::builder()
                .length(nz(10))
                .enforce_convergence(true)
                .build();
            assert_eq!(enforced.required_bars_to_converge(), 33);
            assert_eq!(enforced.lookback(), 33);
            assert_eq!(EmaConfig::close(nz(10)).lookback(), 1);
        }

        #[test]
        fn required_bars_saturate() {
            let enforced = EmaConfig::builder()
                .length(nz(usize::MAX))
                .enforce_convergence(true)
                .build();
            assert_eq!(enforced.required_bars_to_converge(), usize::MAX);
        }
    }

    #[test]
    fn display() {
        assert_eq!(ema(12).to_string(), "EMA(12, Close)");
    }

    #[test]
    #[should_panic(expected = "length is required")]
    fn config_panics_without_length() {
        let _ = EmaConfig::builder().build();
    }
}
