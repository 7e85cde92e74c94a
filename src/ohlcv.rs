/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Bar timestamp or sequence number.
///
/// Used for bar boundary detection. Must be non-decreasing
/// between consecutive calls to [`Indicator::compute`](crate::Indicator::compute).
pub type Timestamp = u64;

/// Price bar used as input to all indicators.
///
/// Only [`close`](Ohlcv::close) and [`open_time`](Ohlcv::open_time) are
/// required. Open, high and low default to the close, so a close-only
/// series (daily closes loaded from a spreadsheet, say) works with every
/// indicator configured on [`PriceSource::Close`](crate::PriceSource::Close)
/// and degrades gracefully on the derived sources.
///
/// # Bar boundaries
///
/// Indicators detect new bars by comparing [`open_time`](Ohlcv::open_time)
/// values: same timestamp updates (repaints) the current bar, a new timestamp
/// advances the window.
///
/// # Example
///
/// ```
/// use marketlens_ta::{Ohlcv, Price, Timestamp};
///
/// struct Candle {
///     h: f64, l: f64, c: f64,
///     ts: u64,
/// }
///
/// impl Ohlcv for Candle {
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn open_time(&self) -> Timestamp { self.ts }
/// }
///
/// let candle = Candle { h: 12.0, l: 9.0, c: 11.0, ts: 1 };
/// assert_eq!(candle.open(), 11.0);
/// ```
pub trait Ohlcv {
    /// Opening price of the bar. Defaults to the close.
    fn open(&self) -> Price {
        self.close()
    }

    /// Highest price during the bar. Defaults to the close.
    fn high(&self) -> Price {
        self.close()
    }

    /// Lowest price during the bar. Defaults to the close.
    fn low(&self) -> Price {
        self.close()
    }

    /// Closing (or latest) price of the bar.
    fn close(&self) -> Price;

    /// Bar open timestamp or sequence number.
    ///
    /// Consecutive calls with the same value repaint the current bar; a new
    /// value advances the indicator window. Behaviour is undefined if
    /// `open_time` decreases.
    fn open_time(&self) -> Timestamp;

    /// Trade volume during the bar. Defaults to `0.0`.
    fn volume(&self) -> f64 {
        0.0
    }
}

/// Re-addresses a bar by its position in a series.
///
/// Batch computation treats every observation as its own bar, even when two
/// observations share a timestamp. Wrapping each one with its index as the
/// `open_time` keeps the streaming indicators from repainting duplicates.
pub(crate) struct Sequenced<'a, O: ?Sized> {
    pub(crate) bar: &'a O,
    pub(crate) index: usize,
}

impl<O: Ohlcv + ?Sized> Ohlcv for Sequenced<'_, O> {
    #[inline]
    fn open(&self) -> Price {
        self.bar.open()
    }

    #[inline]
    fn high(&self) -> Price {
        self.bar.high()
    }

    #[inline]
    fn low(&self) -> Price {
        self.bar.low()
    }

    #[inline]
    fn close(&self) -> Price {
        self.bar.close()
    }

    #[inline]
    fn open_time(&self) -> Timestamp {
        self.index as Timestamp
    }

    #[inline]
    fn volume(&self) -> f64 {
        self.bar.volume()
    }
}

/// A bare value presented as a bar, used to chain indicators (the MACD
/// signal line is an EMA over the MACD line).
#[derive(Clone, Copy, Debug)]
pub(crate) struct Point {
    pub(crate) value: Price,
    pub(crate) open_time: Timestamp,
}

impl Ohlcv for Point {
    #[inline]
    fn close(&self) -> Price {
        self.value
    }

    #[inline]
    fn open_time(&self) -> Timestamp {
        self.open_time
    }
}
