//! Automation Quantiser: a gain LFO sampled like coarse host automation.
//!
//! A sine LFO (1..42 Hz with `brutal`) is only read when the per-channel hold
//! counter expires, so the gain moves in stairs. The grid sets the hold:
//!
//! - **Block**: `max_block / max(1, step_div / 2)` samples
//! - **Samples**: `step_div` samples
//! - **Beat**: a fixed 120 BPM quarter note divided by `step_div`
//!
//! Each step snaps the LFO phase towards a `2π / step_div` lattice
//! (`phase_lock`), quantises the amplitude to a level count derived from
//! `levels` and `brutal`, and may jitter both amplitude and step length. The
//! size of the jump is injected as a zipper click on the stepping sample.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, RandomSource, lerp, sign_or_positive};

use super::POW2_1_128;
use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Brutality (%).
pub const BRUTAL: usize = 0;
/// Grid mode choice.
pub const GRID_MODE: usize = 1;
/// Step division choice.
pub const STEP_DIV: usize = 2;
/// Zipper tone (%).
pub const ZIPPER: usize = 3;
/// Envelope levels (2–64).
pub const LEVELS: usize = 4;
/// Phase lock (%).
pub const PHASE_LOCK: usize = 5;
/// Human error (%).
pub const JITTER: usize = 6;

static GRID_LABELS: [&str; 3] = ["Block", "Samples", "Beat"];

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 7] = [
    ParamDescriptor::percent("Brutalism", "Brutal", 58.0).with_id(ParamId(400), "brutal"),
    ParamDescriptor::choice("Grid Mode", "Grid", &GRID_LABELS, 1).with_id(ParamId(401), "grid_mode"),
    ParamDescriptor::choice("Step Division", "StepDiv", &POW2_1_128, 4)
        .with_id(ParamId(402), "step_div"),
    ParamDescriptor::percent("Zipper Tone", "Zipper", 40.0).with_id(ParamId(403), "zipper"),
    ParamDescriptor::stepped("Env Levels", "Levels", 2.0, 64.0, 10.0).with_id(ParamId(404), "levels"),
    ParamDescriptor::percent("Phase Lock", "PhLock", 62.0).with_id(ParamId(405), "phase_lock"),
    ParamDescriptor::percent("Human Error", "Jitter", 8.0).with_id(ParamId(406), "jitter"),
];

const STEP_DIVS: [i32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
/// Beat grid fallback without a host tempo: 120 BPM quarter notes.
const PSEUDO_BEAT_HZ: f32 = 2.0;

/// Where held steps fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grid {
    /// Fractions of the prepared block size.
    Block,
    /// A fixed sample count.
    Samples,
    /// Subdivisions of a 120 BPM beat.
    Beat,
}

impl Grid {
    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Block,
            1 => Self::Samples,
            _ => Self::Beat,
        }
    }

    /// Samples per step.
    pub fn hold_samples(self, step_div: i32, max_block: usize, sample_rate: f32) -> i32 {
        let step_div = step_div.max(1);
        match self {
            Self::Block => (max_block as i32 / (step_div / 2).max(1)).max(1),
            Self::Samples => step_div,
            Self::Beat => {
                (libm::roundf(sample_rate / (PSEUDO_BEAT_HZ * step_div as f32)) as i32).max(1)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    held_amp: f32,
    counter: i32,
    phase: f32,
}

impl ChannelState {
    fn prepared(ch: usize) -> Self {
        Self {
            held_amp: 1.0,
            counter: 1,
            phase: if ch % 2 == 0 {
                0.0
            } else {
                core::f32::consts::FRAC_PI_2
            },
        }
    }
}

/// The Automation Quantiser variant.
#[derive(Debug, Clone)]
pub struct AutomationQuantiser {
    sample_rate: f32,
    max_block: usize,
    channels: Vec<ChannelState>,
}

impl AutomationQuantiser {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_block: 512,
            channels: Vec::new(),
        }
    }
}

impl Default for AutomationQuantiser {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for AutomationQuantiser {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.max_block = spec.max_block_size;
        self.channels = vec![ChannelState::prepared(0); spec.channels];
        self.reset();
    }

    fn reset(&mut self) {
        for (ch, state) in self.channels.iter_mut().enumerate() {
            *state = ChannelState::prepared(ch);
        }
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        use core::f32::consts::TAU;

        let brutal = params.percent(BRUTAL);
        let grid = Grid::from_index(params.choice(GRID_MODE));
        let step_div = STEP_DIVS[params.choice(STEP_DIV).min(7)];
        let zipper = params.percent(ZIPPER);
        let levels = params.int(LEVELS) as f32;
        let phase_lock = params.percent(PHASE_LOCK);
        let jitter = params.percent(JITTER);

        let hold = grid.hold_samples(step_div, self.max_block, self.sample_rate);
        let quant_levels = (libm::roundf(lerp(levels, (levels * 0.2).max(2.0), brutal)) as i32).max(2);
        let top = (quant_levels - 1) as f32;
        let lfo_rate = lerp(1.0, 42.0, brutal);
        let phase_step = TAU * lfo_rate / self.sample_rate;
        let lock_step = TAU / step_div as f32;
        let depth = lerp(0.2, 1.0, brutal);
        let zipper_gain = zipper * lerp(0.3, 0.9, brutal);
        let drive = lerp(1.2, 3.2, brutal);

        let channels = block.channels().min(self.channels.len());
        for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
            let mut prev_amp = state.held_amp;
            for x in block.channel_mut(ch) {
                let mut stepped = false;
                state.counter -= 1;
                if state.counter <= 0 {
                    state.phase += phase_step;
                    if state.phase > TAU {
                        state.phase -= TAU;
                    }
                    if phase_lock > 0.0 {
                        let snapped = libm::roundf(state.phase / lock_step) * lock_step;
                        state.phase = lerp(state.phase, snapped, phase_lock);
                    }

                    let mut amp = 0.5 + 0.5 * libm::sinf(state.phase);
                    amp = libm::roundf(amp * top) / top;
                    if jitter > 0.0 {
                        amp = (amp + rng.next_bipolar() * jitter * 0.06).clamp(0.0, 1.0);
                    }

                    prev_amp = state.held_amp;
                    state.held_amp = amp;
                    stepped = true;

                    let mut next_hold = hold;
                    if jitter > 0.0 {
                        let offset =
                            libm::roundf(rng.next_bipolar() * jitter * 0.35 * hold as f32) as i32;
                        next_hold = (hold + offset).max(1);
                    }
                    state.counter = next_hold;
                }

                let mut y = *x * lerp(1.0, state.held_amp, depth);
                if stepped {
                    y += (state.held_amp - prev_amp) * zipper_gain * sign_or_positive(y);
                }
                *x = libm::tanhf(y * drive);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::test_util::{all_finite_bounded, render, spec, values};

    fn prepared() -> AutomationQuantiser {
        let mut v = AutomationQuantiser::new();
        v.prepare(&spec());
        v
    }

    #[test]
    fn test_hold_per_grid() {
        assert_eq!(Grid::Samples.hold_samples(16, 512, 48_000.0), 16);
        assert_eq!(Grid::Block.hold_samples(16, 512, 48_000.0), 64);
        assert_eq!(Grid::Block.hold_samples(1, 512, 48_000.0), 512);
        assert_eq!(Grid::Beat.hold_samples(4, 512, 48_000.0), 6000);
    }

    #[test]
    fn test_defaults_bounded() {
        let mut v = prepared();
        let out = render(&mut v, &PARAMS, &values(&PARAMS, &[]), 512, 8, 4);
        assert!(all_finite_bounded(&out, 1.0));
    }

    #[test]
    fn test_gain_constant_between_steps() {
        // no jitter or zipper: the gain applied to a DC input only changes on
        // 16-sample boundaries
        let overrides = [(JITTER, 0.0), (ZIPPER, 0.0), (GRID_MODE, 1.0), (STEP_DIV, 4.0)];
        let vals = values(&PARAMS, &overrides);
        let reader = ParamReader::new(&vals, &PARAMS);
        let mut v = prepared();
        let mut buf = vec![vec![0.3_f32; 256], vec![0.3; 256]];
        let mut rng = digitalis_core::FastRng::new(1);
        v.process(&mut Block::new(&mut buf, 256), &reader, &mut rng);
        // first step happens on sample 0, then every 16
        for run in buf[0].chunks(16) {
            assert!(run.iter().all(|&x| x == run[0]));
        }
    }

    #[test]
    fn test_channels_start_in_quadrature() {
        let v = prepared();
        assert_eq!(v.channels[0].phase, 0.0);
        assert_eq!(v.channels[1].phase, core::f32::consts::FRAC_PI_2);
        assert_eq!(v.channels[0].held_amp, 1.0);
    }
}
