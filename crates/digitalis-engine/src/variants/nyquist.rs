//! Nyquist Destroyer: modulated sample-and-hold with deliberate aliasing.
//!
//! An LFO sweeps an effective sample rate between `max_sr` and `min_sr`;
//! transients (tracked by a fast-attack envelope) drop it further. Each
//! channel holds its input for `round(sr / effective_sr)` samples and
//! crossfades between the two most recent held values with a randomly warped
//! position. A tone-filtered, saturated copy of the output feeds back into
//! the input.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, ParamScale, RandomSource, lerp};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Destroy amount (%).
pub const DESTROY: usize = 0;
/// Lowest effective sample rate (Hz).
pub const MIN_SR: usize = 1;
/// Highest effective sample rate (Hz).
pub const MAX_SR: usize = 2;
/// Sweep LFO rate (Hz).
pub const MOD_RATE: usize = 3;
/// Sweep depth (%).
pub const MOD_DEPTH: usize = 4;
/// Interpolation error (%).
pub const INTERP_ERR: usize = 5;
/// Transient-driven rate drop (%).
pub const TRANSIENT: usize = 6;
/// Alias feedback (0–95 %).
pub const FEEDBACK: usize = 7;
/// Feedback tone (%).
pub const FB_TONE: usize = 8;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 9] = [
    ParamDescriptor::percent("Destroy", "Destroy", 58.0).with_id(ParamId(200), "destroy"),
    ParamDescriptor::hertz("Min SR", "MinSR", 1000.0, 48000.0, 6000.0)
        .with_id(ParamId(201), "min_sr"),
    ParamDescriptor::hertz("Max SR", "MaxSR", 4000.0, 96000.0, 44100.0)
        .with_id(ParamId(202), "max_sr"),
    ParamDescriptor::hertz("SR Mod Rate", "ModRate", 0.05, 20.0, 2.4)
        .with_step(0.01)
        .with_scale(ParamScale::Power(1.0 / 0.33))
        .with_id(ParamId(203), "mod_rate"),
    ParamDescriptor::percent("SR Mod Depth", "Depth", 72.0).with_id(ParamId(204), "mod_depth"),
    ParamDescriptor::percent("Interp Error", "Interp", 48.0).with_id(ParamId(205), "interp_err"),
    ParamDescriptor::percent("Transient Drop", "TrnDrop", 60.0).with_id(ParamId(206), "transient"),
    ParamDescriptor::percent_range("Alias Feedback", "Fdbk", 0.0, 95.0, 24.0)
        .with_id(ParamId(207), "feedback"),
    ParamDescriptor::percent("Feedback Tone", "FbTone", 50.0).with_id(ParamId(208), "fb_tone"),
];

const ENV_ATTACK: f32 = 0.65;
const ENV_RELEASE: f32 = 0.9965;
const FLOOR_SR: f32 = 750.0;

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    counter: i32,
    previous: f32,
    current: f32,
    feedback: f32,
    tone: f32,
}

impl ChannelState {
    const PREPARED: Self = Self {
        counter: 1,
        previous: 0.0,
        current: 0.0,
        feedback: 0.0,
        tone: 0.0,
    };
}

/// The Nyquist Destroyer variant.
#[derive(Debug, Clone)]
pub struct NyquistDestroyer {
    sample_rate: f32,
    phase: f32,
    envelope: f32,
    channels: Vec<ChannelState>,
}

impl NyquistDestroyer {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            phase: 0.0,
            envelope: 0.0,
            channels: Vec::new(),
        }
    }
}

impl Default for NyquistDestroyer {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for NyquistDestroyer {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.channels = vec![ChannelState::PREPARED; spec.channels];
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.envelope = 0.0;
        self.channels.fill(ChannelState::PREPARED);
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        let destroy = params.percent(DESTROY);
        let mut min_sr = params.value(MIN_SR);
        let mut max_sr = params.value(MAX_SR);
        if min_sr > max_sr {
            core::mem::swap(&mut min_sr, &mut max_sr);
        }
        let mod_rate = params.value(MOD_RATE);
        let mod_depth = params.percent(MOD_DEPTH);
        let interp = params.percent(INTERP_ERR);
        let transient = params.percent(TRANSIENT);
        let feedback = params.percent(FEEDBACK);
        let fb_tone = params.percent(FB_TONE);

        let sr = self.sample_rate;
        let phase_inc = core::f32::consts::TAU * mod_rate / sr;
        let max_hold = ((sr / 600.0) as i32).max(2);
        let drive = lerp(1.0, 2.6, destroy);
        let fb_drive = lerp(1.0, 1.8, destroy);
        let tone_coeff = lerp(0.015, 0.65, fb_tone);
        // with max_sr below the floor the clamp would be inverted
        let ceiling = max_sr.max(FLOOR_SR);

        let channels = block.channels().min(self.channels.len());
        for i in 0..block.frames() {
            let energy = block.frame_energy(i);
            self.envelope = if energy > self.envelope {
                ENV_ATTACK * energy + (1.0 - ENV_ATTACK) * self.envelope
            } else {
                ENV_RELEASE * self.envelope + (1.0 - ENV_RELEASE) * energy
            };

            let lfo = 0.5 + 0.5 * libm::sinf(self.phase);
            self.phase += phase_inc;
            if self.phase > core::f32::consts::TAU {
                self.phase -= core::f32::consts::TAU;
            }

            let sweep = lerp(max_sr, min_sr, mod_depth * lfo);
            let drop = lerp(1.0, 0.08, transient * self.envelope);
            let effective = (sweep * drop).clamp(FLOOR_SR, ceiling);
            let hold = (libm::roundf(sr / effective) as i32).clamp(1, max_hold);

            for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
                let input = block.get(ch, i) + state.feedback * feedback;

                state.counter -= 1;
                if state.counter <= 0 {
                    state.previous = state.current;
                    state.current = input;
                    state.counter = hold;
                }

                let frac = 1.0 - state.counter as f32 / hold.max(1) as f32;
                let warped = (frac + rng.next_bipolar() * interp * 0.9).clamp(0.0, 1.0);
                let wrong = lerp(state.previous, state.current, warped);
                let mut out = lerp(state.current, wrong, interp);

                out = libm::tanhf(out * drive);
                state.tone += (out - state.tone) * tone_coeff;
                state.feedback = libm::tanhf(state.tone * fb_drive);

                block.set(ch, i, out);
            }
        }
    }
}
