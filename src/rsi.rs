use std::{fmt::Display, num::NonZero};

use serde::{Deserialize, Serialize};

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource, Timestamp,
    ring_buffer::RingBuffer,
};

/// How [`Rsi`] averages gains and losses.
///
/// The two conventions give materially different values after the first
/// output bar and must not be mixed when comparing results.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiSmoothing {
    /// Wilder's smoothing (`α = 1 / length`) seeded with the plain mean of
    /// the first `length` changes. The textbook RSI.
    #[default]
    Wilder,
    /// Plain rolling mean of the last `length` changes (Cutler's RSI).
    Simple,
}

impl Display for RsiSmoothing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Configuration for the Relative Strength Index ([`Rsi`])
/// indicator.
///
/// Output begins at bar `length + 1`: the first `length` price
/// changes have to be observed before any average exists.
///
/// # Example
///
/// ```
/// use marketlens_ta::{IndicatorConfig, RsiConfig, RsiSmoothing};
/// use std::num::NonZero;
///
/// let config = RsiConfig::close(NonZero::new(14).unwrap());
/// assert_eq!(config.length(), 14);
/// assert_eq!(config.smoothing(), RsiSmoothing::Wilder);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RsiConfig {
    length: usize,
    source: PriceSource,
    smoothing: RsiSmoothing,
}

impl IndicatorConfig for RsiConfig {
    type Builder = RsiConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        RsiConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }

    /// `length` changes need `length + 1` bars.
    #[inline]
    fn lookback(&self) -> usize {
        self.length.saturating_add(1)
    }
}

impl RsiConfig {
    /// RSI on closing price with Wilder's smoothing.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }

    #[inline]
    #[must_use]
    pub fn smoothing(&self) -> RsiSmoothing {
        self.smoothing
    }
}

impl Display for RsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RsiConfig({}, {}, {})",
            self.length, self.source, self.smoothing
        )
    }
}

/// Builder for [`RsiConfig`].
///
/// Defaults: source = [`PriceSource::Close`],
/// smoothing = [`RsiSmoothing::Wilder`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct RsiConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
    smoothing: RsiSmoothing,
}

impl RsiConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
            smoothing: RsiSmoothing::Wilder,
        }
    }

    /// Sets the averaging convention.
    #[inline]
    #[must_use]
    pub fn smoothing(mut self, smoothing: RsiSmoothing) -> Self {
        self.smoothing = smoothing;
        self
    }
}

impl IndicatorConfigBuilder<RsiConfig> for RsiConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.length = Some(length.get());
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> RsiConfig {
        RsiConfig {
            length: self.length.expect("length is required"),
            source: self.source,
            smoothing: self.smoothing,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum WilderState {
    Seeding {
        sum_gain: f64,
        sum_loss: f64,
        count: usize,
    },
    Smoothing {
        avg_gain: f64,
        avg_loss: f64,
    },
}

impl WilderState {
    const EMPTY: Self = Self::Seeding {
        sum_gain: 0.0,
        sum_loss: 0.0,
        count: 0,
    };

    #[inline]
    fn advance(self, gain: f64, loss: f64, params: &Params) -> Self {
        match self {
            Self::Seeding {
                sum_gain,
                sum_loss,
                count,
            } => {
                let (sum_gain, sum_loss, count) = (sum_gain + gain, sum_loss + loss, count + 1);

                if count == params.length {
                    Self::Smoothing {
                        avg_gain: sum_gain * params.length_reciprocal,
                        avg_loss: sum_loss * params.length_reciprocal,
                    }
                } else {
                    Self::Seeding {
                        sum_gain,
                        sum_loss,
                        count,
                    }
                }
            }
            Self::Smoothing { avg_gain, avg_loss } => Self::Smoothing {
                avg_gain: avg_gain.mul_add(params.length_minus_one, gain)
                    * params.length_reciprocal,
                avg_loss: avg_loss.mul_add(params.length_minus_one, loss)
                    * params.length_reciprocal,
            },
        }
    }
}

#[derive(Clone, Debug)]
enum Smoother {
    /// `committed` holds the state through the previous bar's change,
    /// `current` adds the (possibly repainted) change of the current bar.
    Wilder {
        committed: WilderState,
        current: WilderState,
    },
    Simple {
        gains: RingBuffer,
        losses: RingBuffer,
    },
}

impl Smoother {
    fn new(smoothing: RsiSmoothing, length: usize) -> Self {
        match smoothing {
            RsiSmoothing::Wilder => Self::Wilder {
                committed: WilderState::EMPTY,
                current: WilderState::EMPTY,
            },
            RsiSmoothing::Simple => Self::Simple {
                gains: RingBuffer::new(length),
                losses: RingBuffer::new(length),
            },
        }
    }

    #[inline]
    fn push(&mut self, gain: f64, loss: f64, params: &Params) {
        match self {
            Self::Wilder { committed, current } => {
                *committed = *current;
                *current = committed.advance(gain, loss, params);
            }
            Self::Simple { gains, losses } => {
                gains.push(gain);
                losses.push(loss);
            }
        }
    }

    #[inline]
    fn repaint(&mut self, gain: f64, loss: f64, params: &Params) {
        match self {
            Self::Wilder { committed, current } => {
                *current = committed.advance(gain, loss, params);
            }
            Self::Simple { gains, losses } => {
                gains.replace(gain);
                losses.replace(loss);
            }
        }
    }

    #[inline]
    fn averages(&self, params: &Params) -> Option<(f64, f64)> {
        match self {
            Self::Wilder {
                current: WilderState::Smoothing { avg_gain, avg_loss },
                ..
            } => Some((*avg_gain, *avg_loss)),
            Self::Wilder { .. } => None,
            Self::Simple { gains, losses } => gains.is_ready().then(|| {
                // Running sums can drift a hair below zero.
                (
                    gains.sum().max(0.0) * params.length_reciprocal,
                    losses.sum().max(0.0) * params.length_reciprocal,
                )
            }),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Params {
    length: usize,
    length_reciprocal: f64,
    length_minus_one: f64,
}

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes on
/// a 0–100 scale. Each bar contributes `gain = max(Δ, 0)` and
/// `loss = max(−Δ, 0)`, averaged per [`RsiSmoothing`]:
///
/// ```text
/// Wilder: avg = (prev_avg × (length − 1) + x) / length
/// Simple: avg = mean of the last `length` values
/// RSI     = 100 − 100 / (1 + avg_gain / avg_loss)
/// ```
///
/// Edge cases: `avg_loss == 0` with gains gives 100, `avg_gain == 0`
/// with losses gives 0, and a window without any movement yields `None`
/// (no signal).
///
/// Feeding a bar with the same `open_time` recomputes from the previous
/// state without advancing.
///
/// # Example
///
/// ```
/// use marketlens_ta::{Rsi, RsiConfig};
/// use std::num::NonZero;
/// # use marketlens_ta::{Ohlcv, Price, Timestamp};
/// #
/// # struct Bar(f64, u64);
/// # impl Ohlcv for Bar {
/// #     fn close(&self) -> Price { self.0 }
/// #     fn open_time(&self) -> Timestamp { self.1 }
/// # }
///
/// let mut rsi = Rsi::new(RsiConfig::close(NonZero::new(3).unwrap()));
///
/// // Need 3 price changes (4 bars)
/// assert_eq!(rsi.compute(&Bar(10.0, 1)), None);
/// assert_eq!(rsi.compute(&Bar(12.0, 2)), None);
/// assert_eq!(rsi.compute(&Bar(11.0, 3)), None);
///
/// // Changes +2, −1, +2 → avg_gain = 4/3, avg_loss = 1/3 → RSI = 80
/// assert_eq!(rsi.compute(&Bar(13.0, 4)), Some(80.0));
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    config: RsiConfig,
    params: Params,
    smoother: Smoother,
    prev_price: Price,
    cur_price: Price,
    seen_bars: usize,
    last_open_time: Option<Timestamp>,
    current: Option<Price>,
}

impl Indicator for Rsi {
    type Config = RsiConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            #[allow(clippy::cast_precision_loss)]
            params: Params {
                length: config.length,
                length_reciprocal: 1.0 / config.length as f64,
                length_minus_one: (config.length - 1) as f64,
            },
            smoother: Smoother::new(config.smoothing, config.length),
            prev_price: 0.0,
            cur_price: 0.0,
            seen_bars: 0,
            last_open_time: None,
            current: None,
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
            self.prev_price = self.cur_price;
            self.last_open_time = Some(ohlcv.open_time());
            self.seen_bars += 1;
        }

        let price = self.config.source.extract(ohlcv);
        self.cur_price = price;

        // First bar: no change to measure yet.
        if self.seen_bars < 2 {
            return None;
        }

        let (gain, loss) = Self::gain_and_loss(self.prev_price, price);
        if is_next_bar {
            self.smoother.push(gain, loss, &self.params);
        } else {
            self.smoother.repaint(gain, loss, &self.params);
        }

        self.current = self
            .smoother
            .averages(&self.params)
            .and_then(|(avg_gain, avg_loss)| Self::rsi_from_averages(avg_gain, avg_loss));

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }

    #[inline]
    fn config(&self) -> &RsiConfig {
        &self.config
    }
}

impl Rsi {
    #[inline]
    fn gain_and_loss(prev_price: Price, price: Price) -> (Price, Price) {
        let change = price - prev_price;
        (change.max(0.0), (-change).max(0.0))
    }

    #[inline]
    fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
        if avg_loss == 0.0 {
            (avg_gain > 0.0).then_some(100.0)
        } else if avg_gain == 0.0 {
            Some(0.0)
        } else {
            Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
        }
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RSI({}, {}, {})",
            self.config.length, self.config.source, self.config.smoothing
        )
    }
}
