//! Mathematical utility functions for DSP.
//!
//! Small, allocation-free helpers used throughout the variant implementations.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Shaping
//!
//! - [`soft_clip`] - tanh saturation
//! - [`hard_clip`] - symmetric clamp
//! - [`quantise`] - uniform amplitude quantisation
//!
//! # Utilities
//!
//! - [`lerp`] - Linear interpolation
//! - [`wet_dry_mix`] - Crossfade between dry and processed signals
//! - [`rms`] - Root mean square of a slice

use libm::{expf, logf, roundf, sqrtf, tanhf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use digitalis_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs below 1e-9 read as -180 dB.
///
/// # Example
/// ```rust
/// use digitalis_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-9)) * FACTOR
}

/// Soft clip using hyperbolic tangent.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Hard clip to ±threshold range.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Linear interpolation: `a` at `t = 0`, `b` at `t = 1`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Uniform quantisation to `steps` levels per unit.
///
/// Computes `round(x * steps) / steps`. A non-positive `steps` returns the
/// input unchanged.
///
/// # Example
/// ```rust
/// use digitalis_core::quantise;
///
/// assert_eq!(quantise(0.26, 4.0), 0.25);
/// assert_eq!(quantise(-0.9, 2.0), -1.0);
/// ```
#[inline]
pub fn quantise(x: f32, steps: f32) -> f32 {
    if steps <= 0.0 {
        return x;
    }
    roundf(x * steps) / steps
}

/// Flush values below 1e-20 to zero.
///
/// Recursive filters decaying towards silence otherwise settle in the
/// subnormal range, which is slow on most FPUs.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals: `dry + (wet - dry) * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

/// Sign of `x` as ±1, with zero mapped to +1.
#[inline]
pub fn sign_or_positive(x: f32) -> f32 {
    if x < 0.0 { -1.0 } else { 1.0 }
}

/// Root mean square of a slice. Empty slices return 0.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    sqrtf((sum / samples.len() as f64) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_roundtrip() {
        let original = 0.5;
        let back = db_to_linear(linear_to_db(original));
        assert!((original - back).abs() < 1e-5, "{original} -> {back}");
    }

    #[test]
    fn test_linear_to_db_floor() {
        assert!((linear_to_db(0.0) + 180.0).abs() < 0.01);
    }

    #[test]
    fn test_quantise_levels() {
        assert_eq!(quantise(0.49, 2.0), 0.5);
        assert_eq!(quantise(0.2, 2.0), 0.0);
        assert_eq!(quantise(0.3, 0.0), 0.3);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
    }

    #[test]
    fn test_sign_or_positive_zero() {
        assert_eq!(sign_or_positive(0.0), 1.0);
        assert_eq!(sign_or_positive(-0.0), 1.0);
        assert_eq!(sign_or_positive(-0.1), -1.0);
    }

    #[test]
    fn test_rms_of_square_wave() {
        let square = [0.5, -0.5, 0.5, -0.5];
        assert!((rms(&square) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(1e-3), 1e-3);
    }

    #[test]
    fn test_clips_bounded() {
        assert!(soft_clip(10.0) <= 1.0);
        assert_eq!(hard_clip(3.0, 0.8), 0.8);
        assert_eq!(hard_clip(-3.0, 0.8), -0.8);
    }
}
