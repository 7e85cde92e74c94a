use serde::{Deserialize, Serialize};

use crate::{IndicatorError, Ohlcv, Price, Timestamp};

/// One row of a [`PriceSeries`].
///
/// Only `close` is required; indicators that read open, high or low fall
/// back to the close when those are absent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Price>,
    pub close: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Observation {
    /// Close-only observation.
    #[must_use]
    pub fn close(timestamp: Timestamp, close: Price) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// Full OHLC observation without volume.
    #[must_use]
    pub fn ohlc(timestamp: Timestamp, open: Price, high: Price, low: Price, close: Price) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: None,
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    fn validate(&self, index: usize) -> Result<(), IndicatorError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", Some(self.close)),
        ];
        if let Some((field, _)) = prices
            .into_iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
        {
            return Err(IndicatorError::NonFiniteValue { index, field });
        }

        if self.volume.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(IndicatorError::InvalidVolume { index });
        }

        Ok(())
    }
}

impl Ohlcv for Observation {
    #[inline]
    fn open(&self) -> Price {
        self.open.unwrap_or(self.close)
    }

    #[inline]
    fn high(&self) -> Price {
        self.high.unwrap_or(self.close)
    }

    #[inline]
    fn low(&self) -> Price {
        self.low.unwrap_or(self.close)
    }

    #[inline]
    fn close(&self) -> Price {
        self.close
    }

    #[inline]
    fn open_time(&self) -> Timestamp {
        self.timestamp
    }

    #[inline]
    fn volume(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }
}

/// Validated, time-ordered price observations.
///
/// Every price field present is finite, volumes are non-negative and
/// timestamps never decrease (equal timestamps are accepted). The series is
/// immutable once built; indicator functions borrow it and return new
/// series.
///
/// # Example
///
/// ```
/// use marketlens_ta::{Observation, PriceSeries};
///
/// let series = PriceSeries::new(vec![
///     Observation::close(1, 10.0),
///     Observation::close(2, 11.0),
/// ])?;
/// assert_eq!(series.closes(), vec![10.0, 11.0]);
///
/// assert!(PriceSeries::new(vec![Observation::close(1, f64::NAN)]).is_err());
/// # Ok::<(), marketlens_ta::IndicatorError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    observations: Vec<Observation>,
}

impl PriceSeries {
    /// Validates and wraps `observations`.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::NonFiniteValue`], [`IndicatorError::InvalidVolume`]
    /// or [`IndicatorError::DecreasingTimestamp`] for the first offending
    /// observation.
    pub fn new(observations: Vec<Observation>) -> Result<Self, IndicatorError> {
        for (index, observation) in observations.iter().enumerate() {
            observation.validate(index)?;
        }

        if let Some(index) = observations
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(IndicatorError::DecreasingTimestamp { index: index + 1 });
        }

        Ok(Self { observations })
    }

    /// Close-only series with timestamps `0, 1, 2, …`.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::NonFiniteValue`] if any close is NaN or infinite.
    pub fn from_closes(closes: &[Price]) -> Result<Self, IndicatorError> {
        Self::new(
            closes
                .iter()
                .zip(0..)
                .map(|(&close, timestamp)| Observation::close(timestamp, close))
                .collect(),
        )
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Observation> {
        self.observations.iter()
    }

    #[must_use]
    pub fn closes(&self) -> Vec<Price> {
        self.observations.iter().map(|o| o.close).collect()
    }

    #[must_use]
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    pub(crate) fn require_non_empty(&self) -> Result<(), IndicatorError> {
        if self.is_empty() {
            Err(IndicatorError::EmptySeries)
        } else {
            Ok(())
        }
    }
}

impl<'de> Deserialize<'de> for PriceSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let observations = Vec::<Observation>::deserialize(deserializer)?;
        Self::new(observations).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Vec<Observation>> for PriceSeries {
    type Error = IndicatorError;

    fn try_from(observations: Vec<Observation>) -> Result<Self, Self::Error> {
        Self::new(observations)
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// An indicator's output, aligned index-for-index with its input.
///
/// `None` marks positions without enough history (or, for RSI, a window
/// without any movement). Nothing is dropped: `len()` always equals the
/// input length and `timestamps()` are the input's.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndicatorSeries {
    name: String,
    timestamps: Vec<Timestamp>,
    values: Vec<Option<Price>>,
}

impl IndicatorSeries {
    pub(crate) fn new(
        name: impl Into<String>,
        timestamps: Vec<Timestamp>,
        values: Vec<Option<Price>>,
    ) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self {
            name: name.into(),
            timestamps,
            values,
        }
    }

    /// Indicator label, e.g. `SMA(20, Close)`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`; `None` if undefined or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Price> {
        self.values.get(index).copied().flatten()
    }

    #[must_use]
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    #[must_use]
    pub fn values(&self) -> &[Option<Price>] {
        &self.values
    }

    /// `(timestamp, value)` pairs, undefined ones included.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Timestamp, Option<Price>)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// `(timestamp, value)` pairs with a defined value.
    pub fn defined(&self) -> impl Iterator<Item = (Timestamp, Price)> + '_ {
        self.iter().filter_map(|(t, v)| v.map(|v| (t, v)))
    }

    /// Length of the undefined prefix.
    #[must_use]
    pub fn leading_undefined(&self) -> usize {
        self.values.iter().take_while(|v| v.is_none()).count()
    }

    /// Last defined value, if any.
    #[must_use]
    pub fn last_defined(&self) -> Option<Price> {
        self.values.iter().rev().find_map(|v| *v)
    }
}

/// MACD line, signal line and histogram, each aligned with the input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

impl MacdSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}
