//! Fixed-capacity circular buffer.
//!
//! Delay lines, loop memories and scratch buffers in the variants all reduce to
//! the same structure: a heap block allocated once at prepare time, a write
//! cursor, and reads at a (possibly fractional) position that must wrap back
//! into range before indexing.
//!
//! # Memory
//!
//! The buffer is allocated in [`RingBuffer::new`] and never resized. Every read
//! and write wraps its index, so no access can leave the allocation.

use alloc::vec;
use alloc::vec::Vec;

/// Circular buffer with a single write cursor.
///
/// # Example
///
/// ```rust
/// use digitalis_core::RingBuffer;
///
/// let mut ring = RingBuffer::new(4);
/// for x in [1.0, 2.0, 3.0] {
///     ring.write(x);
/// }
/// assert_eq!(ring.read_back(0), 3.0);
/// assert_eq!(ring.read_back(2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<f32>,
    write_pos: usize,
}

impl RingBuffer {
    /// Allocate a zeroed buffer holding `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Number of samples the buffer holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Index the next [`write`](Self::write) will store to.
    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Store a sample at the cursor and advance it.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.data[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.data.len();
    }

    /// Sample written `delay` writes before the most recent one.
    ///
    /// `read_back(0)` is the latest sample; `delay` wraps modulo capacity.
    #[inline]
    pub fn read_back(&self, delay: usize) -> f32 {
        let len = self.data.len();
        let idx = (self.write_pos + len - 1 - delay % len) % len;
        self.data[idx]
    }

    /// Sample at absolute index `pos`, wrapped modulo capacity.
    #[inline]
    pub fn get(&self, pos: usize) -> f32 {
        self.data[pos % self.data.len()]
    }

    /// Overwrite the sample at absolute index `pos`, wrapped modulo capacity.
    #[inline]
    pub fn set(&mut self, pos: usize, sample: f32) {
        let len = self.data.len();
        self.data[pos % len] = sample;
    }

    /// Wrap any finite position into `[0, capacity)`.
    ///
    /// Non-finite positions map to 0.
    #[inline]
    pub fn wrap_position(&self, pos: f64) -> f64 {
        if !pos.is_finite() {
            return 0.0;
        }
        let len = self.data.len() as f64;
        let mut wrapped = libm::fmod(pos, len);
        if wrapped < 0.0 {
            wrapped += len;
        }
        // tiny negative inputs round up to exactly len
        if wrapped >= len { 0.0 } else { wrapped }
    }

    /// Linearly interpolated read at a fractional position (wrapped).
    #[inline]
    pub fn read_interpolated(&self, pos: f64) -> f32 {
        let pos = self.wrap_position(pos);
        let len = self.data.len();
        let i0 = (pos as usize).min(len - 1);
        let i1 = (i0 + 1) % len;
        let frac = (pos - i0 as f64) as f32;
        let a = self.data[i0];
        a + (self.data[i1] - a) * frac
    }

    /// Zero the contents and rewind the cursor.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.write_pos = 0;
    }
}
