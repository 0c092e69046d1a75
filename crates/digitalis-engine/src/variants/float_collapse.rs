//! Floating-Point Collapse: IEEE-754 damage as an effect.
//!
//! # Theory
//!
//! A 32-bit float spends 23 bits on the mantissa and 8 on the exponent. The
//! variant attacks both, plus the temporal and block structure around them:
//!
//! 1. **Drive**: `x *= dB(18 * collapse)`.
//! 2. **Temporal hold**: each channel latches a new sample every `hold`
//!    samples (zero-order hold, no rate conversion).
//! 3. **Block floating point**: within each analysis block the peak fixes a
//!    shared exponent `e`; samples are stored as `round(x / 2^e * steps) /
//!    steps * 2^e` with `steps = 2^(5 + 7 * collapse)`.
//! 4. **Bit damage**: optional one- or two-ULP rounding errors, mantissa
//!    truncation to `mantissa_bits`, exponent snapped to multiples of
//!    `exponent_step`.
//! 5. **Nonlinear quantiser**: uniform, logarithmic, mu-law (mu = 255) or a
//!    logistic-map index scrambler, with `max(8, 2048 - 1850 * collapse)`
//!    levels.
//! 6. **Denormal bursts**: near-silent samples occasionally start a burst of
//!    8..72 samples of tiny noise.
//!
//! Output is clamped to ±1.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{
    ParamDescriptor, ParamId, RandomSource, db_to_linear, frexp, ldexp, lerp, quantise,
    quantise_exponent, step_toward, truncate_mantissa,
};

use super::POW2_1_128;
use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Collapse amount (%).
pub const COLLAPSE: usize = 0;
/// Mantissa bits kept (3–23).
pub const MANTISSA_BITS: usize = 1;
/// Exponent snapping step (1–16).
pub const EXPONENT_STEP: usize = 2;
/// Temporal hold length choice.
pub const TEMPORAL_HOLD: usize = 3;
/// Analysis block size choice.
pub const BLOCK_SIZE: usize = 4;
/// Nonlinear quantiser curve choice.
pub const QUANT_CURVE: usize = 5;
/// Rounding chaos (%).
pub const ROUNDING: usize = 6;
/// Denormal burst amount (%).
pub const DENORMAL: usize = 7;

static BLOCK_LABELS: [&str; 8] = ["8", "16", "32", "64", "128", "256", "512", "1024"];
static CURVE_LABELS: [&str; 4] = ["Uniform", "Log", "MuLaw", "Chaotic"];

const HOLD_SAMPLES: [i32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
const BLOCK_SAMPLES: [usize; 8] = [8, 16, 32, 64, 128, 256, 512, 1024];

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 8] = [
    ParamDescriptor::percent("Collapse", "Collapse", 55.0).with_id(ParamId(100), "collapse"),
    ParamDescriptor::stepped("Mantissa Bits", "Mant", 3.0, 23.0, 11.0)
        .with_id(ParamId(101), "mantissa_bits"),
    ParamDescriptor::stepped("Exponent Step", "ExpStep", 1.0, 16.0, 3.0)
        .with_id(ParamId(102), "exponent_step"),
    ParamDescriptor::choice("Temporal Hold", "Hold", &POW2_1_128, 3)
        .with_id(ParamId(103), "temporal_hold"),
    ParamDescriptor::choice("Block Size", "Block", &BLOCK_LABELS, 4)
        .with_id(ParamId(104), "block_size"),
    ParamDescriptor::choice("Quant Curve", "Curve", &CURVE_LABELS, 2)
        .with_id(ParamId(105), "quant_curve"),
    ParamDescriptor::percent("Rounding Chaos", "Round", 18.0).with_id(ParamId(106), "rounding"),
    ParamDescriptor::percent("Denormal Burst", "Denorm", 8.0).with_id(ParamId(107), "denormal"),
];

const CHAOS_SEED: f32 = 0.371;

/// Shape of the final magnitude quantiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantCurve {
    /// Evenly spaced levels.
    Uniform,
    /// `log1p` companding with a collapse-dependent curve.
    Log,
    /// G.711-style mu-law, mu = 255.
    MuLaw,
    /// Level index offset by a logistic-map sequence.
    Chaotic,
}

impl QuantCurve {
    fn from_index(index: usize) -> Self {
        match index {
            1 => Self::Log,
            2 => Self::MuLaw,
            3 => Self::Chaotic,
            _ => Self::Uniform,
        }
    }
}

/// The Floating-Point Collapse variant.
#[derive(Debug, Clone)]
pub struct FloatCollapse {
    countdown: Vec<i32>,
    held: Vec<f32>,
    chaos: f32,
    /// Remaining samples of the current denormal burst, shared by all channels.
    burst_remaining: u32,
}

impl FloatCollapse {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            countdown: Vec::new(),
            held: Vec::new(),
            chaos: CHAOS_SEED,
            burst_remaining: 0,
        }
    }

    fn apply_float_damage<R: RandomSource>(
        x: f32,
        mantissa_bits: u32,
        exponent_step: u32,
        rounding: f32,
        rng: &mut R,
    ) -> f32 {
        if x.abs() < 1.0e-35 {
            return 0.0;
        }
        let rounding = rounding.clamp(0.0, 1.0);
        let mut x = x;
        if rounding > 0.0 && rng.chance(rounding) {
            let up = rng.next_bool();
            x = step_toward(x, up);
            if rng.chance(rounding * 0.5) {
                x = step_toward(x, up);
            }
        }
        quantise_exponent(truncate_mantissa(x, mantissa_bits), exponent_step)
    }

    fn apply_curve(&mut self, x: f32, curve: QuantCurve, amount: f32) -> f32 {
        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let levels = (2048.0 - amount * 1850.0).max(8.0);
        let mut mag = x.abs().clamp(0.0, 1.0);

        mag = match curve {
            QuantCurve::Uniform => quantise(mag, levels),
            QuantCurve::Log => compand(mag, 1.0 + amount * 18.0, levels),
            QuantCurve::MuLaw => compand(mag, 255.0, levels),
            QuantCurve::Chaotic => {
                self.chaos = (3.99 * self.chaos * (1.0 - self.chaos)).clamp(0.0001, 0.9999);
                let steps = levels as i32;
                let top = (steps - 1) as f32;
                let idx = libm::roundf(mag * top) as i32 + (self.chaos * top) as i32;
                (idx % steps) as f32 / top
            }
        };

        (sign * mag).clamp(-1.0, 1.0)
    }
}

/// `log1p` companding round-trip through `levels` uniform steps.
#[inline]
fn compand(mag: f32, curve: f32, levels: f32) -> f32 {
    let norm = libm::log1pf(curve);
    let encoded = libm::log1pf(curve * mag) / norm;
    libm::expm1f(quantise(encoded, levels) * norm) / curve
}

impl Default for FloatCollapse {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for FloatCollapse {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.countdown = vec![0; spec.channels];
        self.held = vec![0.0; spec.channels];
        self.reset();
    }

    fn reset(&mut self) {
        self.countdown.fill(0);
        self.held.fill(0.0);
        self.chaos = CHAOS_SEED;
        self.burst_remaining = 0;
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        let collapse = params.percent(COLLAPSE);
        let mantissa_bits = params.int(MANTISSA_BITS).max(0) as u32;
        let exponent_step = params.int(EXPONENT_STEP).max(0) as u32;
        let hold = HOLD_SAMPLES[params.choice(TEMPORAL_HOLD).min(7)];
        let analysis = BLOCK_SAMPLES[params.choice(BLOCK_SIZE).min(7)];
        let curve = QuantCurve::from_index(params.choice(QUANT_CURVE));
        let rounding = params.percent(ROUNDING) + collapse * 0.35;
        let denormal = params.percent(DENORMAL);

        let drive = db_to_linear(18.0 * collapse);
        let steps = libm::powf(2.0, lerp(5.0, 12.0, collapse));
        let burst_floor = lerp(1.0e-12, 1.0e-5, denormal);

        let frames = block.frames();
        let channels = block.channels().min(self.held.len());
        let mut start = 0;
        while start < frames {
            let len = analysis.min(frames - start);

            let mut peak = 0.0_f32;
            for ch in 0..channels {
                for &x in &block.channel(ch)[start..start + len] {
                    peak = peak.max((x * drive).abs());
                }
            }
            let (_, shared_exp) = frexp(peak + 1.0e-20);

            for ch in 0..channels {
                for i in start..start + len {
                    let mut x = block.get(ch, i) * drive;

                    self.countdown[ch] -= 1;
                    if self.countdown[ch] <= 0 {
                        self.held[ch] = x;
                        self.countdown[ch] = hold;
                    }
                    x = self.held[ch];

                    x = ldexp(quantise(ldexp(x, -shared_exp), steps), shared_exp);
                    x = Self::apply_float_damage(x, mantissa_bits, exponent_step, rounding, rng);
                    x = self.apply_curve(x, curve, collapse);

                    if self.burst_remaining > 0 {
                        x += rng.next_bipolar() * 1.0e-4 * denormal;
                        self.burst_remaining -= 1;
                    } else if x.abs() < burst_floor && rng.chance(denormal * 0.015) {
                        self.burst_remaining = 8 + rng.next_below(64);
                    }

                    block.set(ch, i, x.clamp(-1.0, 1.0));
                }
            }
            start += len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::test_util::{all_finite_bounded, render, spec, values};
    use digitalis_core::FastRng;

    fn prepared() -> FloatCollapse {
        let mut v = FloatCollapse::new();
        v.prepare(&spec());
        v
    }

    #[test]
    fn test_defaults_bounded() {
        let mut v = prepared();
        let out = render(&mut v, &PARAMS, &values(&PARAMS, &[]), 512, 8, 1);
        assert!(all_finite_bounded(&out, 1.0));
        assert!(out[0].iter().any(|&x| x != 0.0));
    }

    #[test]
    fn test_temporal_hold_repeats_values() {
        // hold of 8 samples, no other damage that could break up the runs
        let overrides = [
            (COLLAPSE, 0.0),
            (MANTISSA_BITS, 23.0),
            (EXPONENT_STEP, 1.0),
            (TEMPORAL_HOLD, 3.0),
            (QUANT_CURVE, 0.0),
            (ROUNDING, 0.0),
            (DENORMAL, 0.0),
        ];
        let mut v = prepared();
        let out = render(&mut v, &PARAMS, &values(&PARAMS, &overrides), 256, 1, 1);
        for run in out[0].chunks(8) {
            assert!(run.iter().all(|&x| x == run[0]), "{run:?}");
        }
    }

    #[test]
    fn test_float_damage_zeroes_tiny_values() {
        let mut rng = FastRng::new(3);
        assert_eq!(FloatCollapse::apply_float_damage(1.0e-36, 8, 2, 1.0, &mut rng), 0.0);
        let y = FloatCollapse::apply_float_damage(0.3, 23, 1, 0.0, &mut rng);
        assert_eq!(y, 0.3);
    }

    #[test]
    fn test_curves_stay_in_unit_range() {
        let mut v = prepared();
        for curve in [
            QuantCurve::Uniform,
            QuantCurve::Log,
            QuantCurve::MuLaw,
            QuantCurve::Chaotic,
        ] {
            for i in -20..=20 {
                let x = i as f32 * 0.07;
                let y = v.apply_curve(x, curve, 1.0);
                assert!((-1.0..=1.0).contains(&y), "{curve:?} {x} -> {y}");
            }
        }
    }

    #[test]
    fn test_mu_law_keeps_sign_and_rough_level() {
        let mut v = prepared();
        let y = v.apply_curve(-0.5, QuantCurve::MuLaw, 0.0);
        assert!((y + 0.5).abs() < 0.01, "{y}");
    }

    #[test]
    fn test_reset_restores_chaos_state() {
        let mut v = prepared();
        v.apply_curve(0.2, QuantCurve::Chaotic, 0.5);
        assert_ne!(v.chaos, CHAOS_SEED);
        v.reset();
        assert_eq!(v.chaos, CHAOS_SEED);
    }

    #[test]
    fn test_extreme_settings_finite() {
        let mins: Vec<f32> = PARAMS.iter().map(|d| d.min).collect();
        let maxs: Vec<f32> = PARAMS.iter().map(|d| d.max).collect();
        for vals in [mins, maxs] {
            let mut v = prepared();
            let out = render(&mut v, &PARAMS, &vals, 300, 4, 9);
            assert!(all_finite_bounded(&out, 1.0));
        }
    }
}
