//! Technical indicators and market-data helpers for Rust.
//!
//! Two ways in:
//!
//! - **Streaming.** [`Sma`], [`Ema`], [`Rsi`] and [`Macd`] accept any type
//!   implementing [`Ohlcv`] one bar at a time and return typed results.
//!   Values are `None` until enough data has been received for
//!   convergence. A bar with the same `open_time` as the previous one
//!   replaces it (repaint).
//! - **Batch.** [`moving_average`], [`exponential_moving_average`],
//!   [`relative_strength_index`] and [`macd`] take a whole [`PriceSeries`]
//!   and return series aligned index-for-index with the input.
//!
//! Each streaming indicator exposes [`new`](Sma::new),
//! [`compute`](Sma::compute), [`value`](Sma::value) and
//! [`config`](Sma::config) as inherent
//! methods, so no trait import is needed. Import [`Indicator`] only for
//! generic code.
//!
//! Around the indicators sit [`percent_change`] and [`fill_missing`] for
//! derived series, [`iqr_outliers`] and [`z_score_outliers`] for outlier
//! masks, [`Summary`] and [`pearson_correlation`] for descriptive
//! statistics, and [`IndicatorSettings`] for TOML-driven reports.

mod ema;
mod engine;
mod error;
mod indicator;
mod macd;
mod ohlcv;
mod outlier;
mod price_source;
mod price_window;
mod ring_buffer;
mod rsi;
mod series;
mod settings;
mod sma;
mod stats;
mod transform;

pub use crate::error::{ErrorKind, IndicatorError};
pub use crate::indicator::{Indicator, IndicatorConfig, IndicatorConfigBuilder};
pub use crate::ohlcv::{Ohlcv, Price, Timestamp};
pub use crate::price_source::PriceSource;
pub use crate::series::{IndicatorSeries, MacdSeries, Observation, PriceSeries};

pub use crate::ema::{Ema, EmaConfig, EmaConfigBuilder};
pub use crate::macd::{Macd, MacdConfig, MacdConfigBuilder, MacdValue};
pub use crate::rsi::{Rsi, RsiConfig, RsiConfigBuilder, RsiSmoothing};
pub use crate::sma::{Sma, SmaConfig, SmaConfigBuilder};

pub use crate::engine::{
    ema, exponential_moving_average, macd, macd_default, moving_average,
    relative_strength_index, relative_strength_index_with,
};
pub use crate::outlier::{DEFAULT_Z_THRESHOLD, IQR_FENCE, iqr_outliers, z_score_outliers};
pub use crate::settings::{IndicatorReport, IndicatorSettings, MacdSettings, RsiSettings};
pub use crate::stats::{Summary, pearson_correlation, quantile};
pub use crate::transform::{FillMethod, fill_missing, percent_change};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::compute`].
            #[inline]
            pub fn compute(&mut self, kline: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::compute(self, kline)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }

            /// See [`Indicator::config`].
            #[must_use]
            #[inline]
            pub fn config(&self) -> &$config {
                <Self as Indicator>::config(self)
            }
        }
    };
}

impl_indicator_methods!(Sma, SmaConfig, Price);
impl_indicator_methods!(Ema, EmaConfig, Price);
impl_indicator_methods!(Rsi, RsiConfig, Price);
impl_indicator_methods!(Macd, MacdConfig, MacdValue);

#[cfg(test)]
mod test_util;
