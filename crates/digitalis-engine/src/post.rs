//! Post-processing shared by every variant.
//!
//! Per block:
//!
//! 1. [`AutoLevel`] measures RMS across all channels of the variant output
//!    and slowly steers a compensation gain towards the variant's target.
//! 2. Per sample, a [`DcBlocker`] strips offsets, the signal is scaled by the
//!    output trim times the blended auto-level gain, then [`SafetyLimiter`]
//!    saturates and clamps it.
//!
//! The limiter is normalised by `1 / tanh(drive)`, so a full-scale sample
//! maps to full scale before the ceiling clamp.

use alloc::vec::Vec;

use digitalis_core::{DcBlocker, db_to_linear, hard_clip, lerp, soft_clip};

use crate::Block;

/// Pole of the per-channel DC blockers.
pub const DC_POLE: f32 = 0.995;

/// Slow loudness compensation towards a fixed RMS target.
///
/// ## Example
///
/// ```rust
/// use digitalis_engine::post::AutoLevel;
///
/// let mut level = AutoLevel::new(0.17);
/// for _ in 0..2000 {
///     level.update(0.085);
/// }
/// assert!((level.gain() - 2.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AutoLevel {
    target: f32,
    gain: f32,
}

impl AutoLevel {
    /// Smoothing coefficient applied once per block.
    pub const SMOOTHING: f32 = 0.02;
    /// Compensation ratio bounds.
    pub const MIN_RATIO: f32 = 0.25;
    /// See [`MIN_RATIO`](Self::MIN_RATIO).
    pub const MAX_RATIO: f32 = 4.0;

    /// Compensator steering towards `target` RMS, starting at unity.
    pub fn new(target: f32) -> Self {
        Self { target, gain: 1.0 }
    }

    /// Fold one block's RMS into the smoothed gain and return it.
    #[inline]
    pub fn update(&mut self, rms: f32) -> f32 {
        let ratio = (self.target / (rms + 1.0e-6)).clamp(Self::MIN_RATIO, Self::MAX_RATIO);
        self.gain += (ratio - self.gain) * Self::SMOOTHING;
        self.gain
    }

    /// Current smoothed gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Target RMS.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Back to unity gain.
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

/// Normalised tanh saturation followed by a hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyLimiter {
    drive: f32,
    norm: f32,
    ceiling: f32,
}

impl SafetyLimiter {
    /// Limiter for a safety amount in [0, 1].
    pub fn new(safety: f32) -> Self {
        let safety = safety.clamp(0.0, 1.0);
        let drive = lerp(1.0, 4.2, safety);
        Self {
            drive,
            norm: 1.0 / soft_clip(drive),
            ceiling: lerp(0.995, 0.8, safety),
        }
    }

    /// Output never exceeds this magnitude.
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Limit one sample.
    #[inline]
    pub fn process(&self, x: f32) -> f32 {
        hard_clip(soft_clip(x * self.drive) * self.norm, self.ceiling)
    }
}

/// DC blockers, auto-level and limiter, applied in place to a block.
#[derive(Debug, Clone)]
pub struct PostChain {
    dc: Vec<DcBlocker>,
    level: AutoLevel,
}

/// Universal parameter values as read for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostParams {
    /// Auto-level blend in [0, 1].
    pub autolevel: f32,
    /// Limiter amount in [0, 1].
    pub safety: f32,
    /// Output trim in dB.
    pub output_db: f32,
}

impl PostChain {
    /// Chain for `channels` channels steering towards `target_rms`.
    pub fn new(channels: usize, target_rms: f32) -> Self {
        Self {
            dc: (0..channels).map(|_| DcBlocker::new(DC_POLE)).collect(),
            level: AutoLevel::new(target_rms),
        }
    }

    /// Current auto-level compensation gain.
    pub fn auto_gain(&self) -> f32 {
        self.level.gain()
    }

    /// Clear filter history and return the compensator to unity.
    pub fn reset(&mut self) {
        for dc in &mut self.dc {
            dc.reset();
        }
        self.level.reset();
    }

    /// Process `block` in place.
    pub fn process(&mut self, block: &mut Block<'_>, params: PostParams) {
        if block.is_empty() {
            return;
        }
        let auto_gain = self.level.update(block.rms());
        let gain = db_to_linear(params.output_db) * lerp(1.0, auto_gain, params.autolevel);
        let limiter = SafetyLimiter::new(params.safety);

        let channels = block.channels().min(self.dc.len());
        for (ch, dc) in self.dc[..channels].iter_mut().enumerate() {
            for sample in block.channel_mut(ch) {
                *sample = limiter.process(dc.process(*sample) * gain);
            }
        }
    }
}
