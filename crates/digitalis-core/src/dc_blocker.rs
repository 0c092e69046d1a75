//! DC blocking filter.
//!
//! First-order highpass with transfer function H(z) = (1 - z^-1) / (1 - R*z^-1).
//! With R = 0.995 the -3 dB corner sits around 38 Hz at 48 kHz, which is what the
//! post-processing chain uses to strip offsets the variants introduce.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters with Audio
//! Applications", DC Blocker.

/// One-pole DC blocker: `y[n] = x[n] - x[n-1] + R * y[n-1]`.
///
/// ## Example
///
/// ```rust
/// use digitalis_core::DcBlocker;
///
/// let mut blocker = DcBlocker::new(0.995);
/// let mut y = 0.0;
/// for _ in 0..4000 {
///     y = blocker.process(0.5);
/// }
/// assert!(y.abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DcBlocker {
    pole: f32,
    x_prev: f32,
    y_prev: f32,
}

impl DcBlocker {
    /// Create a blocker with pole `R`, clamped to [0.9, 0.9999].
    pub fn new(pole: f32) -> Self {
        Self {
            pole: pole.clamp(0.9, 0.9999),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.pole * self.y_prev;
        self.x_prev = input;
        self.y_prev = crate::math::flush_denormal(output);
        output
    }

    /// Clear the previous input/output pair.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// The pole position `R`.
    pub fn pole(&self) -> f32 {
        self.pole
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new(0.995)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn test_removes_constant_offset() {
        let mut blocker = DcBlocker::default();
        let mut out = 1.0;
        for _ in 0..10_000 {
            out = blocker.process(0.8);
        }
        assert!(out.abs() < 1e-6, "residual {out}");
    }

    #[test]
    fn test_passes_midrange() {
        let mut blocker = DcBlocker::default();
        let mut peak = 0.0f32;
        for i in 0..48_000 {
            let x = libm::sinf(2.0 * PI * 1000.0 * i as f32 / 48_000.0);
            let y = blocker.process(x);
            if i > 47_000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.95, "1 kHz peak {peak}");
    }

    #[test]
    fn test_reset_clears_history() {
        let mut blocker = DcBlocker::default();
        blocker.process(1.0);
        blocker.reset();
        assert_eq!(blocker.process(0.0), 0.0);
    }

    #[test]
    fn test_pole_clamped() {
        assert_eq!(DcBlocker::new(0.2).pole(), 0.9);
        assert_eq!(DcBlocker::new(1.5).pole(), 0.9999);
    }
}
