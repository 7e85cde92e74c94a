/// Bounded ring of floats with a running sum.
///
/// `push` appends and, once `capacity` values are held, evicts the oldest
/// entry. `replace` overwrites the newest entry in place, which is what a
/// repaint needs. Storage grows with the values actually pushed, so the
/// capacity can exceed any realistic series length.
#[derive(Clone, Debug)]
pub(crate) struct RingBuffer {
    buffer: Vec<f64>,
    capacity: usize,
    head: usize,
    tail: usize,
    sum: f64,
}

impl RingBuffer {
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            buffer: Vec::new(),
            capacity,
            head: 0,
            tail: 0,
            sum: 0.0,
        }
    }

    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Running sum of the stored values.
    #[inline]
    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }

    #[inline]
    pub(crate) fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.is_ready() {
            let old = std::mem::replace(&mut self.buffer[self.head], value);
            self.tail = self.head;
            self.head = (self.head + 1) % self.capacity;
            self.sum -= old;
            Some(old)
        } else {
            self.tail = self.buffer.len();
            self.buffer.push(value);
            None
        };

        self.sum += value;
        evicted
    }

    /// Overwrites the most recently pushed value.
    #[inline]
    pub(crate) fn replace(&mut self, value: f64) -> f64 {
        debug_assert!(!self.is_empty(), "replace on empty ring buffer");
        let old = std::mem::replace(&mut self.buffer[self.tail], value);
        self.sum += value - old;
        old
    }
}
