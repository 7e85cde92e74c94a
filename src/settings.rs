//! Indicator parameters loaded from TOML.
//!
//! ```toml
//! sma_periods = [20, 50]
//!
//! [rsi]
//! period = 14
//! smoothing = "wilder"
//!
//! [macd]
//! fast = 12
//! slow = 26
//! signal = 9
//! ```
//!
//! Every key is optional; missing ones take the values above.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    IndicatorError, IndicatorSeries, MacdConfig, MacdSeries, PriceSeries, RsiSmoothing,
    engine::{macd_with, moving_average, relative_strength_index_with},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RsiSettings {
    pub period: usize,
    pub smoothing: RsiSmoothing,
}

impl Default for RsiSettings {
    fn default() -> Self {
        Self {
            period: 14,
            smoothing: RsiSmoothing::Wilder,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacdSettings {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdSettings {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdSettings {
    fn config(&self) -> Result<MacdConfig, IndicatorError> {
        MacdConfig::try_new(self.fast, self.slow, self.signal)
    }
}

/// The set of indicators to compute over a series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorSettings {
    /// One SMA per entry.
    pub sma_periods: Vec<usize>,
    pub rsi: RsiSettings,
    pub macd: MacdSettings,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            sma_periods: vec![20, 50],
            rsi: RsiSettings::default(),
            macd: MacdSettings::default(),
        }
    }
}

impl IndicatorSettings {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::Settings`] for malformed TOML or unknown keys,
    /// [`IndicatorError::InvalidParameter`] for out-of-range values.
    ///
    /// # Example
    ///
    /// ```
    /// use marketlens_ta::{IndicatorSettings, RsiSmoothing};
    ///
    /// let settings = IndicatorSettings::from_toml_str(
    ///     r#"
    ///     sma_periods = [5]
    ///     rsi = { smoothing = "simple" }
    ///     "#,
    /// )?;
    ///
    /// assert_eq!(settings.sma_periods, [5]);
    /// assert_eq!(settings.rsi.period, 14);
    /// assert_eq!(settings.rsi.smoothing, RsiSmoothing::Simple);
    /// assert_eq!(settings.macd.slow, 26);
    /// # Ok::<(), marketlens_ta::IndicatorError>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, IndicatorError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every period and the MACD span ordering.
    ///
    /// # Errors
    ///
    /// [`IndicatorError::InvalidParameter`] naming the first offending key.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if let Some(position) = self.sma_periods.iter().position(|&p| p == 0) {
            return Err(IndicatorError::invalid(
                "sma_periods",
                format!("entry {position} must be positive"),
            ));
        }
        if self.rsi.period == 0 {
            return Err(IndicatorError::invalid("rsi.period", "must be positive"));
        }
        self.macd.config()?;
        Ok(())
    }

    /// Computes every configured indicator over `series`.
    ///
    /// # Errors
    ///
    /// Anything [`validate`](Self::validate) reports, and
    /// [`IndicatorError::EmptySeries`] for an empty series.
    pub fn compute(&self, series: &PriceSeries) -> Result<IndicatorReport, IndicatorError> {
        self.validate()?;
        debug!(
            sma = self.sma_periods.len(),
            len = series.len(),
            "computing indicator report"
        );

        let sma = self
            .sma_periods
            .iter()
            .map(|&period| moving_average(series, period))
            .collect::<Result<_, _>>()?;
        let rsi = relative_strength_index_with(series, self.rsi.period, self.rsi.smoothing)?;
        let macd = macd_with(series, self.macd.config()?)?;

        Ok(IndicatorReport { sma, rsi, macd })
    }
}

/// Output of [`IndicatorSettings::compute`], every series aligned with the
/// input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndicatorReport {
    /// In `sma_periods` order.
    pub sma: Vec<IndicatorSeries>,
    pub rsi: IndicatorSeries,
    pub macd: MacdSeries,
}
