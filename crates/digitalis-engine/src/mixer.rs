//! Dry/wet crossfade between the host buffer and the processed copy.
//!
//! The engine never writes into host memory until the very end, so the host
//! buffer itself is the dry signal. At mix 0 it is left untouched, which
//! makes bypass bit-exact. Any other ratio produces finite output in
//! [-1, 1]: a non-finite dry sample counts as silence and the blend is
//! clamped to full scale.

use digitalis_core::{hard_clip, wet_dry_mix};

/// Linear crossfade at a fixed ratio.
///
/// ## Example
///
/// ```rust
/// use digitalis_engine::DryWetMixer;
///
/// let mut host = [1.0_f32, 0.5];
/// DryWetMixer::new(0.25).apply(&mut host, &[0.0, 0.0]);
/// assert_eq!(host, [0.75, 0.375]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DryWetMixer {
    mix: f32,
}

impl DryWetMixer {
    /// Mixer for a wet ratio in [0, 1]. Out-of-range and non-finite ratios
    /// are clamped, NaN counts as dry.
    pub fn new(mix: f32) -> Self {
        let mix = if mix.is_nan() { 0.0 } else { mix.clamp(0.0, 1.0) };
        Self { mix }
    }

    /// Wet ratio.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Blend `wet` into `dry` in place, over the shorter of the two.
    #[inline]
    pub fn apply(&self, dry: &mut [f32], wet: &[f32]) {
        let n = dry.len().min(wet.len());
        if self.mix <= 0.0 {
            return;
        }
        if self.mix >= 1.0 {
            dry[..n].copy_from_slice(&wet[..n]);
            return;
        }
        for (d, &w) in dry[..n].iter_mut().zip(&wet[..n]) {
            let host = if d.is_finite() { *d } else { 0.0 };
            *d = hard_clip(wet_dry_mix(host, w, self.mix), 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_mix_is_identity() {
        let mut dry = [0.1_f32, -0.7, f32::MIN_POSITIVE / 4.0];
        let before = dry;
        DryWetMixer::new(0.0).apply(&mut dry, &[1.0, 1.0, 1.0]);
        assert_eq!(dry.map(f32::to_bits), before.map(f32::to_bits));
        DryWetMixer::new(-3.0).apply(&mut dry, &[1.0, 1.0, 1.0]);
        DryWetMixer::new(f32::NAN).apply(&mut dry, &[1.0, 1.0, 1.0]);
        assert_eq!(dry.map(f32::to_bits), before.map(f32::to_bits));
    }

    #[test]
    fn test_full_mix_copies_wet() {
        let mut dry = [0.1_f32, -0.7];
        DryWetMixer::new(1.0).apply(&mut dry, &[0.3, 0.4]);
        assert_eq!(dry, [0.3, 0.4]);
        DryWetMixer::new(7.0).apply(&mut dry, &[0.5, 0.6]);
        assert_eq!(dry, [0.5, 0.6]);
    }

    #[test]
    fn test_partial_mix_interpolates() {
        let mut dry = [0.0_f32, 1.0];
        DryWetMixer::new(0.5).apply(&mut dry, &[1.0, 0.0]);
        assert_eq!(dry, [0.5, 0.5]);
    }

    #[test]
    fn test_partial_mix_sanitises_host_samples() {
        let mut dry = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 3.0, -3.0];
        DryWetMixer::new(0.5).apply(&mut dry, &[0.4; 5]);
        assert_eq!(dry, [0.2, 0.2, 0.2, 1.0, -1.0]);
    }

    #[test]
    fn test_length_mismatch_uses_shorter() {
        let mut dry = [0.0_f32; 3];
        DryWetMixer::new(1.0).apply(&mut dry, &[1.0]);
        assert_eq!(dry, [1.0, 0.0, 0.0]);
    }
}
