use std::{fmt::Display, num::NonZero};

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorError, Ohlcv, Price, PriceSource,
    error::require_period, price_window::PriceWindow,
};

/// Parameters of a simple moving average: window length and price source.
///
/// # Example
///
/// ```rust
/// use marketlens_ta::{IndicatorConfig, SmaConfig};
///
/// let config = SmaConfig::try_close(20)?;
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.lookback(), 20);
/// assert_eq!(config.to_string(), "SmaConfig(20, Close)");
///
/// assert!(SmaConfig::try_close(0).is_err());
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct SmaConfig {
    length: usize,
    source: PriceSource,
}

impl SmaConfig {
    /// Closing-price average over `length` bars.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }

    /// Closing-price average from an unchecked period.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::InvalidParameter`] named `period` when it is zero.
    pub fn try_close(period: usize) -> Result<Self, IndicatorError> {
        require_period("period", period)?;
        Ok(Self {
            length: period,
            source: PriceSource::Close,
        })
    }

    /// Average of the typical price `(high + low + close) / 3`.
    #[must_use]
    pub fn hlc3(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::HLC3)
            .build()
    }
}

impl IndicatorConfig for SmaConfig {
    type Builder = SmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        SmaConfigBuilder {
            length: None,
            source: PriceSource::Close,
        }
    }

    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    /// The first average needs a full window.
    #[inline]
    fn lookback(&self) -> usize {
        self.length
    }
}

impl Display for SmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`SmaConfig`]. The source defaults to the close.
pub struct SmaConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
}

impl IndicatorConfigBuilder<SmaConfig> for SmaConfigBuilder {
    #[inline]
    fn length(self, length: NonZero<usize>) -> Self {
        Self {
            length: Some(length.get()),
            ..self
        }
    }

    #[inline]
    fn source(self, source: PriceSource) -> Self {
        Self { source, ..self }
    }

    #[inline]
    fn build(self) -> SmaConfig {
        SmaConfig {
            length: self.length.expect("length is required"),
            source: self.source,
        }
    }
}

/// Simple moving average: the mean of the last `length` prices.
///
/// Bars are kept in a [`PriceWindow`] with a running sum, so each update
/// is O(1). A window longer than the data seen so far reports `None`, and
/// storage only grows with the bars actually fed.
///
/// This is the streaming form of [`moving_average`](crate::moving_average);
/// fed a series bar by bar it yields the same values.
///
/// # Example
///
/// ```rust
/// use marketlens_ta::{Sma, SmaConfig};
/// # use marketlens_ta::{Ohlcv, Price, Timestamp};
/// #
/// # struct Bar(f64, u64);
/// # impl Ohlcv for Bar {
/// #     fn close(&self) -> Price { self.0 }
/// #     fn open_time(&self) -> Timestamp { self.1 }
/// # }
///
/// let mut sma = Sma::new(SmaConfig::try_close(2)?);
///
/// assert_eq!(sma.compute(&Bar(10.0, 1)), None);
/// assert_eq!(sma.compute(&Bar(20.0, 2)), Some(15.0));
/// // live update of the bar opened at 2
/// assert_eq!(sma.compute(&Bar(40.0, 2)), Some(25.0));
/// assert_eq!(sma.compute(&Bar(60.0, 3)), Some(50.0));
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Sma {
    config: SmaConfig,
    window: PriceWindow,
    current: Option<Price>,
}

impl Indicator for Sma {
    type Config = SmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            window: PriceWindow::new(config.length, config.source),
            config,
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        self.window.add(bar);
        self.current = self.window.mean();
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }

    #[inline]
    fn config(&self) -> &SmaConfig {
        &self.config
    }
}

impl Display for Sma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMA({}, {})", self.config.length, self.config.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{Bar, assert_approx, bar, nz, random_walk};

    fn sma(length: usize) -> Sma {
        Sma::new(SmaConfig::close(nz(length)))
    }

    mod config {
        use super::*;

        #[test]
        fn try_close_matches_close() {
            assert_eq!(SmaConfig::try_close(20).unwrap(), SmaConfig::close(nz(20)));
        }

        #[test]
        fn try_close_rejects_zero() {
            assert!(matches!(
                SmaConfig::try_close(0),
                Err(IndicatorError::InvalidParameter { name: "period", .. })
            ));
        }

        #[test]
        fn lookback_is_the_length() {
            assert_eq!(SmaConfig::close(nz(50)).lookback(), 50);
            assert_eq!(SmaConfig::hlc3(nz(3)).lookback(), 3);
        }

        #[test]
        fn builder_keeps_source() {
            let config = SmaConfig::builder()
                .source(PriceSource::HL2)
                .length(nz(4))
                .build();
            assert_eq!(*config.source(), PriceSource::HL2);
            assert_eq!(config.length(), 4);
        }

        #[test]
        #[should_panic(expected = "length is required")]
        fn build_panics_without_length() {
            let _ = SmaConfig::builder().build();
        }

        #[test]
        fn display() {
            assert_eq!(sma(20).to_string(), "SMA(20, Close)");
            assert_eq!(
                SmaConfig::close(nz(20)).to_string(),
                "SmaConfig(20, Close)"
            );
            assert_eq!(SmaConfig::hlc3(nz(5)).to_string(), "SmaConfig(5, HLC3)");
        }
    }

    mod warm_up {
        use super::*;

        #[test]
        fn none_until_window_full() {
            let mut sma = sma(3);
            assert_eq!(sma.compute(&bar(10.0, 1)), None);
            assert_eq!(sma.compute(&bar(20.0, 2)), None);
            assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
        }

        #[test]
        fn length_one_is_the_price() {
            let mut sma = sma(1);
            assert_eq!(sma.compute(&bar(42.0, 1)), Some(42.0));
            assert_eq!(sma.compute(&bar(7.0, 2)), Some(7.0));
        }

        #[test]
        fn window_longer_than_data_stays_undefined() {
            let mut sma = sma(1 << 40);
            for (price, t) in random_walk(100, 9).into_iter().zip(0..) {
                assert_eq!(sma.compute(&bar(price, t)), None);
            }
            assert_eq!(sma.value(), None);
        }
    }

    mod sliding {
        use super::*;

        #[test]
        fn drops_oldest_on_advance() {
            let mut sma = sma(2);
            sma.compute(&bar(10.0, 1));
            sma.compute(&bar(20.0, 2));
            // (20 + 30) / 2
            assert_eq!(sma.compute(&bar(30.0, 3)), Some(25.0));
        }

        #[test]
        fn matches_mean_of_trailing_slice() {
            let prices = random_walk(60, 21);
            let mut sma = sma(7);

            for (i, (&price, t)) in prices.iter().zip(0..).enumerate() {
                let value = sma.compute(&bar(price, t));
                if i < 6 {
                    assert_eq!(value, None);
                } else {
                    let window = &prices[i - 6..=i];
                    assert_approx!(value.unwrap(), window.iter().sum::<f64>() / 7.0);
                }
            }
        }
    }

    mod repaint {
        use super::*;

        #[test]
        fn updates_current_bar() {
            let mut sma = sma(2);
            sma.compute(&bar(10.0, 1));
            sma.compute(&bar(20.0, 2));
            // (10 + 30) / 2
            assert_eq!(sma.compute(&bar(30.0, 2)), Some(20.0));
        }

        #[test]
        fn repaint_during_warm_up() {
            let mut sma = sma(3);
            sma.compute(&bar(10.0, 1));
            sma.compute(&bar(15.0, 1));
            assert_eq!(sma.compute(&bar(20.0, 2)), None);
            // (15 + 20 + 30) / 3
            assert_approx!(sma.compute(&bar(30.0, 3)).unwrap(), 65.0 / 3.0);
        }
    }

    #[test]
    fn typical_price_source() {
        let mut sma = Sma::new(SmaConfig::hlc3(nz(2)));
        sma.compute(&Bar::new(0.0, 30.0, 0.0, 0.0).at(1)); // 10
        let result = sma.compute(&Bar::new(0.0, 60.0, 0.0, 30.0).at(2)); // 30
        assert_eq!(result, Some(20.0));
    }

    #[test]
    fn clone_has_independent_window() {
        let mut sma = sma(3);
        sma.compute(&bar(10.0, 1));
        sma.compute(&bar(20.0, 2));

        let mut cloned = sma.clone();
        assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
        assert_eq!(cloned.value(), None);
        assert_eq!(cloned.compute(&bar(90.0, 3)), Some(40.0));
        assert_eq!(cloned.config(), sma.config());
    }
}
