//! Spectral Brutalist: bin-domain damage approximated per sample.
//!
//! No transform is taken. Each effect of a spectral brutalist is mimicked in
//! the time domain:
//!
//! - **Freeze**: latch a sample and repeat it for `freeze_len` ms.
//! - **Bin density / cluster**: sample-and-hold with a randomised period of
//!   `cluster * (1 + 10 * bin_density)` to twice that.
//! - **Phase steps / scramble**: ring-modulate by a sine whose phase is
//!   snapped to `phase_steps` positions or replaced by a random phase.
//! - **Sort**: magnitude raised to a power below 1, which flattens the
//!   envelope the way sorting bins by level does.
//!
//! Hold, freeze and phase state live per channel and carry across blocks.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, RandomSource, lerp};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Brutalism (%).
pub const BRUTALISM: usize = 0;
/// Bin density (%).
pub const BIN_DENSITY: usize = 1;
/// Cluster size choice.
pub const CLUSTER: usize = 2;
/// Freeze rate (%).
pub const FREEZE_RATE: usize = 3;
/// Freeze length (ms).
pub const FREEZE_LEN: usize = 4;
/// Phase scramble (%).
pub const PHASE_SCRAMBLE: usize = 5;
/// Phase steps (2–64).
pub const PHASE_STEPS: usize = 6;
/// Sort amount (%).
pub const SORT_AMOUNT: usize = 7;
/// Spectral jitter (%).
pub const JITTER: usize = 8;

static CLUSTER_LABELS: [&str; 6] = ["1", "2", "4", "8", "16", "32"];
const CLUSTER_SIZES: [i32; 6] = [1, 2, 4, 8, 16, 32];

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 9] = [
    ParamDescriptor::percent("Brutalism", "Brutal", 60.0).with_id(ParamId(600), "brutalism"),
    ParamDescriptor::percent("Bin Density", "Density", 52.0).with_id(ParamId(601), "bin_density"),
    ParamDescriptor::choice("Cluster", "Cluster", &CLUSTER_LABELS, 2).with_id(ParamId(602), "cluster"),
    ParamDescriptor::percent("Freeze Rate", "FrzRate", 25.0).with_id(ParamId(603), "freeze_rate"),
    ParamDescriptor::time_ms("Freeze Length", "FrzLen", 10.0, 1200.0, 150.0)
        .with_id(ParamId(604), "freeze_len"),
    ParamDescriptor::percent("Phase Scramble", "Scramble", 32.0)
        .with_id(ParamId(605), "phase_scramble"),
    ParamDescriptor::stepped("Phase Steps", "PhSteps", 2.0, 64.0, 16.0)
        .with_id(ParamId(606), "phase_steps"),
    ParamDescriptor::percent("Sort Amount", "Sort", 35.0).with_id(ParamId(607), "sort_amount"),
    ParamDescriptor::percent("Spectral Jitter", "Jitter", 18.0).with_id(ParamId(608), "jitter"),
];

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    held: f32,
    hold_counter: i32,
    phase: f32,
    freeze_value: f32,
    freeze_counter: i32,
}

/// The Spectral Brutalist variant.
#[derive(Debug, Clone)]
pub struct SpectralBrutalist {
    sample_rate: f32,
    channels: Vec<ChannelState>,
}

impl SpectralBrutalist {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            channels: Vec::new(),
        }
    }
}

impl Default for SpectralBrutalist {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for SpectralBrutalist {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.channels = vec![ChannelState::default(); spec.channels];
    }

    fn reset(&mut self) {
        self.channels.fill(ChannelState::default());
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        use core::f32::consts::{PI, TAU};

        let brutalism = params.percent(BRUTALISM);
        let density = params.percent(BIN_DENSITY);
        let cluster = CLUSTER_SIZES[params.choice(CLUSTER).min(5)];
        let freeze_rate = params.percent(FREEZE_RATE);
        let freeze_ms = params.value(FREEZE_LEN);
        let scramble = params.percent(PHASE_SCRAMBLE);
        let phase_steps = params.int(PHASE_STEPS).max(2);
        let sort = params.percent(SORT_AMOUNT);
        let jitter = params.percent(JITTER);

        let freeze_samples = (libm::roundf(freeze_ms * 0.001 * self.sample_rate) as i32).max(1);
        let hold_base = (cluster * ((1.0 + density * 10.0) as i32).max(1)).max(1);
        let hold_span = hold_base.max(2) as u32;
        let phase_lattice = TAU / phase_steps as f32;
        let phase_inc = lerp(0.01, 0.25, brutalism) + jitter * 0.04;
        let exponent = lerp(1.0, 0.28, sort);
        let drive = lerp(1.0, 2.4, brutalism);

        let channels = block.channels().min(self.channels.len());
        for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
            for sample in block.channel_mut(ch) {
                let mut x = *sample;

                if state.freeze_counter > 0 {
                    x = state.freeze_value;
                    state.freeze_counter -= 1;
                } else if rng.chance(freeze_rate * 0.02) {
                    state.freeze_value = x;
                    state.freeze_counter = freeze_samples;
                }

                state.hold_counter -= 1;
                if state.hold_counter <= 0 {
                    state.held = x;
                    state.hold_counter = (hold_base + rng.next_below(hold_span) as i32).max(1);
                }
                x = lerp(x, state.held, density);

                state.phase += phase_inc;
                if state.phase > TAU {
                    state.phase -= TAU;
                }
                let snapped = libm::roundf(state.phase / phase_lattice) * phase_lattice;
                let random_phase = rng.next_f32() * TAU - PI;
                let carrier = libm::sinf(lerp(snapped, random_phase, scramble));
                x = lerp(x, x * carrier, scramble);

                x = libm::copysignf(libm::powf(x.abs(), exponent), x);

                *sample = libm::tanhf(x * drive).clamp(-1.0, 1.0);
            }
        }
    }
}
