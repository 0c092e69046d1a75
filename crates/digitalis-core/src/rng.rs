//! Pseudo-random streams for probabilistic glitch decisions.
//!
//! Every variant draws from a [`RandomSource`] handed in by the engine rather
//! than from a global generator, so tests can substitute a fixed-seed or fully
//! scripted stream.
//!
//! [`FastRng`] is a 32-bit linear congruential generator (Numerical Recipes
//! constants 1664525 / 1013904223). The low bits of an LCG have short periods,
//! so every derived value is taken from the high bits.
//!
//! Reference: Press et al., "Numerical Recipes", 2nd ed., section 7.1.

/// A deterministic-given-seed stream of pseudo-random numbers.
///
/// Only [`next_u32`](Self::next_u32) is required, the other draws are derived
/// from it.
pub trait RandomSource {
    /// Next raw 32-bit value.
    fn next_u32(&mut self) -> u32;

    /// Rewind the stream to its initial seed. Streams without a seed may
    /// leave this as a no-op.
    fn reset(&mut self) {}

    /// Uniform value in [0, 1).
    #[inline]
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform value in [-1, 1).
    #[inline]
    fn next_bipolar(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    /// Uniform integer in `0..bound`. Returns 0 when `bound` is 0.
    #[inline]
    fn next_below(&mut self, bound: u32) -> u32 {
        ((u64::from(self.next_u32()) * u64::from(bound)) >> 32) as u32
    }

    /// Fair coin flip.
    #[inline]
    fn next_bool(&mut self) -> bool {
        self.next_u32() & 0x8000_0000 != 0
    }

    /// `true` with probability `p` (values outside [0, 1] saturate).
    #[inline]
    fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}

/// Seeded 32-bit LCG.
///
/// # Example
///
/// ```rust
/// use digitalis_core::{FastRng, RandomSource};
///
/// let mut a = FastRng::new(7);
/// let mut b = FastRng::new(7);
/// assert_eq!(a.next_u32(), b.next_u32());
///
/// a.reset();
/// b.reset();
/// assert_eq!(a.next_f32(), b.next_f32());
/// ```
#[derive(Debug, Clone)]
pub struct FastRng {
    seed: u32,
    state: u32,
}

impl FastRng {
    /// Create a generator with an explicit seed.
    pub const fn new(seed: u32) -> Self {
        Self { seed, state: seed }
    }

    /// Create a generator seeded from the process hasher keys and the clock.
    ///
    /// Two calls are not expected to produce the same stream.
    #[cfg(feature = "std")]
    pub fn from_entropy() -> Self {
        use std::hash::{BuildHasher, Hasher};

        let mut hasher = std::collections::hash_map::RandomState::new().build_hasher();
        if let Ok(elapsed) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            hasher.write_u128(elapsed.as_nanos());
        }
        let wide = hasher.finish();
        Self::new((wide ^ (wide >> 32)) as u32)
    }

    /// The seed this stream restarts from on [`reset`](RandomSource::reset).
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for FastRng {
    fn default() -> Self {
        Self::new(0x2545_F491)
    }
}

impl RandomSource for FastRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.state
    }

    fn reset(&mut self) {
        self.state = self.seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = FastRng::new(1234);
        let mut b = FastRng::new(1234);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_reset_rewinds() {
        let mut rng = FastRng::new(99);
        let first: [u32; 4] = core::array::from_fn(|_| rng.next_u32());
        rng.reset();
        let again: [u32; 4] = core::array::from_fn(|_| rng.next_u32());
        assert_eq!(first, again);
    }

    #[test]
    fn test_unit_range() {
        let mut rng = FastRng::new(5);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
            let b = rng.next_bipolar();
            assert!((-1.0..1.0).contains(&b));
        }
    }

    #[test]
    fn test_next_below_bounds() {
        let mut rng = FastRng::new(5);
        assert_eq!(rng.next_below(0), 0);
        let mut seen = [false; 7];
        for _ in 0..1000 {
            let v = rng.next_below(7) as usize;
            assert!(v < 7);
            seen[v] = true;
        }
        assert!(seen.iter().all(|&s| s), "every bucket should be hit");
    }

    #[test]
    fn test_mean_near_half() {
        let mut rng = FastRng::new(42);
        let n = 20_000;
        let mean: f32 = (0..n).map(|_| rng.next_f32()).sum::<f32>() / n as f32;
        assert!((mean - 0.5).abs() < 0.02, "mean {mean}");
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = FastRng::new(3);
        assert!((0..100).all(|_| rng.chance(1.0)));
        assert!((0..100).all(|_| !rng.chance(0.0)));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_entropy_seeds_differ() {
        let seeds: Vec<u32> = (0..8).map(|_| FastRng::from_entropy().seed()).collect();
        assert!(seeds.windows(2).any(|w| w[0] != w[1]));
    }
}
