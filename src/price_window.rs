use crate::{Ohlcv, Price, PriceSource, Timestamp};
use std::collections::VecDeque;

/// Upper bound on the up-front allocation; longer windows grow as bars
/// arrive.
const PREALLOCATED_BARS: usize = 1024;

/// Trailing window of extracted prices with a running sum.
///
/// A bar with the same `open_time` as the last one replaces the newest
/// entry; a later `open_time` appends and, once full, evicts the oldest.
#[derive(Clone, Debug)]
pub(crate) struct PriceWindow {
    size: usize,
    window: VecDeque<Price>,
    /// Maintained incrementally via add/subtract. May accumulate FP rounding
    /// drift over very long runs, negligible for typical window sizes.
    sum: Price,
    source: PriceSource,
    last_open_time: Option<Timestamp>,
}

impl PriceWindow {
    pub fn new(size: usize, source: PriceSource) -> Self {
        Self {
            size,
            source,
            sum: 0.0,
            window: VecDeque::with_capacity(size.min(PREALLOCATED_BARS)),
            last_open_time: None,
        }
    }

    #[inline]
    pub fn add(&mut self, ohlcv: &impl Ohlcv) {
        debug_assert!(
            self.last_open_time.is_none_or(|t| t <= ohlcv.open_time()),
            "open_time must be non-decreasing: last={}, got={}",
            self.last_open_time.unwrap_or(0),
            ohlcv.open_time(),
        );

        let is_next_bar = self.last_open_time.is_none_or(|t| t < ohlcv.open_time());

        let evicted = if is_next_bar {
            self.last_open_time = Some(ohlcv.open_time());
            if self.is_ready() {
                self.window.pop_front()
            } else {
                None
            }
        } else {
            self.window.pop_back()
        };

        if let Some(old_price) = evicted {
            self.sum -= old_price;
        }

        let price = self.source.extract(ohlcv);
        self.window.push_back(price);
        self.sum += price;
    }

    #[inline]
    pub fn sum(&self) -> Option<Price> {
        self.is_ready().then_some(self.sum)
    }

    /// Sum divided by the window size, once full.
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<Price> {
        self.sum().map(|sum| sum / self.size as f64)
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.window.len() == self.size
    }
}
