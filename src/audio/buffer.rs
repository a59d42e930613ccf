//! Fixed-capacity circular (ring) buffer backing the estimator histories.
//!
//! When the buffer is full, a new entry **overwrites** the oldest one so the
//! most-recent `capacity` entries are always available.  Both the pitch and
//! the formant estimator keep their rolling history in a `RingBuffer`, and
//! every windowed statistic reads the trailing entries through
//! [`RingBuffer::recent`].
//!
//! # Example
//!
//! ```rust
//! use voice_trainer::audio::RingBuffer;
//!
//! let mut buf = RingBuffer::new(4);
//! for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
//!     buf.push(x); // 5 items → capacity 4 → oldest dropped
//! }
//! assert_eq!(buf.recent(2).collect::<Vec<_>>(), vec![4.0, 5.0]);
//! assert_eq!(buf.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0, 5.0]);
//! ```

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer with FIFO eviction.
///
/// Generic over `T: Copy + Default` so it can hold plain `f64` pitch values
/// as well as [`crate::analysis::FormantSample`] triples.
///
/// ## Overflow behaviour
///
/// When [`push`](Self::push) would exceed `capacity`, the oldest entry is
/// silently overwritten.  The buffer never allocates beyond its initial
/// capacity.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    capacity: usize,
    /// Index of the *next* write position (wraps around `capacity`).
    write_pos: usize,
    /// Number of valid entries currently stored (≤ `capacity`).
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![T::default(); capacity],
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    /// Append one entry, evicting the oldest when full.
    pub fn push(&mut self, item: T) {
        self.buf[self.write_pos] = item;
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Index of the oldest stored entry inside `buf`.
    fn read_pos(&self) -> usize {
        // Until the first overflow valid data starts at 0; afterwards the
        // oldest entry sits where the next write would go.
        if self.len < self.capacity {
            0
        } else {
            self.write_pos
        }
    }

    /// Iterate all stored entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let start = self.read_pos();
        (0..self.len).map(move |i| self.buf[(start + i) % self.capacity])
    }

    /// Iterate the trailing `n` entries (or all of them when fewer are
    /// stored), oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = T> + '_ {
        let skip = self.len.saturating_sub(n);
        self.iter().skip(skip)
    }

    /// Most recently pushed entry.
    pub fn last(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.write_pos + self.capacity - 1) % self.capacity;
        Some(self.buf[idx])
    }

    /// Discard all entries and reset the write position.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Number of valid entries currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the buffer contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
