//! Measurement stimulus and level report.
//!
//! The stimulus is a stereo mix meant to look like programme material to
//! the level-dependent stages:
//!
//! | Component        | Level   | Right-channel weight |
//! |------------------|---------|----------------------|
//! | 97 Hz sine       | −14 dB  | 0.92                 |
//! | 1880 Hz sine     | −21 dB  | 1.06                 |
//! | uniform noise    | −31 dB  | 1.04                 |
//! | noise burst      | −9 dB   | 0.95                 |
//!
//! The burst is on for the first 80 ms of every 1.3 s. Both channels are
//! clamped to ±1. [`measure`] runs an engine over the stimulus and compares
//! input and output RMS over the whole run.

use alloc::vec;

use digitalis_core::{FastRng, ParamSource, RandomSource, db_to_linear};

use crate::Engine;

const LOW_HZ: f64 = 97.0;
const HIGH_HZ: f64 = 1880.0;
const BURST_PERIOD_S: f64 = 1.3;
const BURST_LENGTH_S: f64 = 0.08;

/// Deterministic generator for the measurement signal.
#[derive(Debug, Clone)]
pub struct Stimulus {
    sample_rate: f64,
    phase_low: f64,
    phase_high: f64,
    position: u64,
    noise: FastRng,
}

impl Stimulus {
    /// Generator at `sample_rate` whose noise is drawn from `seed`.
    pub fn new(sample_rate: f32, seed: u32) -> Self {
        Self {
            sample_rate: f64::from(sample_rate),
            phase_low: 0.0,
            phase_high: 0.0,
            position: 0,
            noise: FastRng::new(seed),
        }
    }

    /// Next stereo frame.
    pub fn next_frame(&mut self) -> (f32, f32) {
        let t = self.position as f64 / self.sample_rate;
        let burst_on = libm::fmod(t, BURST_PERIOD_S) < BURST_LENGTH_S;

        let low = libm::sin(self.phase_low) as f32 * db_to_linear(-14.0);
        let high = libm::sin(self.phase_high) as f32 * db_to_linear(-21.0);
        let noise = self.noise.next_bipolar() * db_to_linear(-31.0);
        let burst = if burst_on {
            self.noise.next_bipolar() * db_to_linear(-9.0)
        } else {
            0.0
        };

        let tau = core::f64::consts::TAU;
        self.phase_low += tau * LOW_HZ / self.sample_rate;
        self.phase_high += tau * HIGH_HZ / self.sample_rate;
        if self.phase_low > tau {
            self.phase_low -= tau;
        }
        if self.phase_high > tau {
            self.phase_high -= tau;
        }
        self.position += 1;

        let left = (low + high + noise + burst).clamp(-1.0, 1.0);
        let right = (low * 0.92 + high * 1.06 + noise * 1.04 + burst * 0.95).clamp(-1.0, 1.0);
        (left, right)
    }

    /// Fill two channels with consecutive frames.
    pub fn fill(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.next_frame();
        }
    }
}

/// Result of [`measure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureReport {
    /// Stimulus RMS in dB.
    pub input_rms_db: f32,
    /// Engine output RMS in dB.
    pub output_rms_db: f32,
    /// `output_rms_db - input_rms_db`.
    pub delta_db: f32,
    /// Largest output magnitude seen.
    pub peak: f32,
    /// `false` if any output sample was NaN or infinite.
    pub finite: bool,
}

fn to_db(rms: f64) -> f32 {
    20.0 * libm::log10f((rms as f32).max(1.0e-9))
}

/// Run `engine` over `seconds` of the stereo stimulus in `block`-sized
/// calls and report levels.
///
/// The engine must already be prepared for at least two channels; the
/// stimulus noise seed is fixed so runs with the same engine seed match.
pub fn measure<R: RandomSource, P: ParamSource + ?Sized>(
    engine: &mut Engine<R>,
    params: &P,
    seconds: f32,
    block: usize,
) -> MeasureReport {
    let sample_rate = engine.spec().map_or(48_000.0, |s| s.sample_rate);
    let block = block.max(1);
    let total = (seconds.max(0.0) * sample_rate) as usize;

    let mut stimulus = Stimulus::new(sample_rate, 0x5EED);
    let mut left = vec![0.0_f32; block];
    let mut right = vec![0.0_f32; block];
    let (mut in_sq, mut out_sq) = (0.0_f64, 0.0_f64);
    let mut peak = 0.0_f32;
    let mut finite = true;

    let mut done = 0;
    while done < total {
        let n = block.min(total - done);
        let (l, r) = (&mut left[..n], &mut right[..n]);
        stimulus.fill(l, r);
        in_sq += l.iter().chain(r.iter()).map(|&x| f64::from(x) * f64::from(x)).sum::<f64>();

        engine.process(&mut [&mut *l, &mut *r], params);

        for &y in l.iter().chain(r.iter()) {
            if y.is_finite() {
                out_sq += f64::from(y) * f64::from(y);
                peak = peak.max(y.abs());
            } else {
                finite = false;
            }
        }
        done += n;
    }

    let count = (2 * total).max(1) as f64;
    let input_rms_db = to_db(libm::sqrt(in_sq / count));
    let output_rms_db = to_db(libm::sqrt(out_sq / count));
    MeasureReport {
        input_rms_db,
        output_rms_db,
        delta_db: output_rms_db - input_rms_db,
        peak,
        finite,
    }
}
