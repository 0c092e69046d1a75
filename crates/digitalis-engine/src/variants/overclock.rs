//! Overclock Failure Emulator: a processor running too hot for its workload.
//!
//! Per block, input energy drives a smoothed stress envelope and integrates a
//! thermal state. Together they set a failure probability:
//!
//! ```text
//! fail = clamp(failure_rate * (0.25 + 0.75 * stress) + thermal * 0.28, 0, 0.85)
//! ```
//!
//! Per sample, failures hold the last value, drop samples, and make the
//! read head of a short delay line jump (latency spikes). Between spikes the
//! read offset walks one sample at a time back to its nominal value, which
//! includes a per-channel desync (the odd channel drifts harder). A slow
//! thermal oscillator modulates the output level.

use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, RandomSource, RingBuffer, lerp};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Overclock amount (%).
pub const OVERCLOCK: usize = 0;
/// Input sensitivity (%).
pub const SENSITIVITY: usize = 1;
/// Failure rate (%).
pub const FAILURE_RATE: usize = 2;
/// Latency spike amount (%).
pub const LATENCY_SPIKE: usize = 3;
/// Channel desync (%).
pub const DESYNC: usize = 4;
/// Thermal drift (%).
pub const THERMAL: usize = 5;
/// Recovery speed (%).
pub const RECOVERY: usize = 6;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 7] = [
    ParamDescriptor::percent("Overclock", "Overclk", 55.0).with_id(ParamId(700), "overclock"),
    ParamDescriptor::percent("Sensitivity", "Sens", 60.0).with_id(ParamId(701), "sensitivity"),
    ParamDescriptor::percent("Failure Rate", "Failure", 34.0).with_id(ParamId(702), "failure_rate"),
    ParamDescriptor::percent("Latency Spike", "Spike", 28.0).with_id(ParamId(703), "latency_spike"),
    ParamDescriptor::percent("L/R Desync", "Desync", 32.0).with_id(ParamId(704), "desync"),
    ParamDescriptor::percent("Thermal Drift", "Thermal", 48.0).with_id(ParamId(705), "thermal"),
    ParamDescriptor::percent("Recovery", "Recover", 42.0).with_id(ParamId(706), "recovery"),
];

#[derive(Debug, Clone)]
struct ChannelState {
    delay: RingBuffer,
    read_offset: usize,
    hold_value: f32,
    hold_remaining: u32,
}

impl ChannelState {
    fn new(capacity: usize) -> Self {
        Self {
            delay: RingBuffer::new(capacity),
            read_offset: 1,
            hold_value: 0.0,
            hold_remaining: 0,
        }
    }

    fn reset(&mut self) {
        self.delay.clear();
        self.read_offset = 1;
        self.hold_value = 0.0;
        self.hold_remaining = 0;
    }
}

/// The Overclock Failure Emulator variant.
#[derive(Debug, Clone)]
pub struct OverclockFailure {
    stress: f32,
    thermal: f32,
    /// Samples processed since prepare; drives the drift oscillator.
    elapsed: u64,
    channels: Vec<ChannelState>,
}

impl OverclockFailure {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            stress: 0.0,
            thermal: 0.0,
            elapsed: 0,
            channels: Vec::new(),
        }
    }

    /// Current thermal state in [0, 1].
    pub fn thermal_state(&self) -> f32 {
        self.thermal
    }
}

impl Default for OverclockFailure {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for OverclockFailure {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let capacity = 2048.max((0.25 * spec.sample_rate) as usize);
        self.channels = (0..spec.channels)
            .map(|_| ChannelState::new(capacity))
            .collect();
        self.reset();
    }

    fn reset(&mut self) {
        self.stress = 0.0;
        self.thermal = 0.0;
        self.elapsed = 0;
        for state in &mut self.channels {
            state.reset();
        }
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        let overclock = params.percent(OVERCLOCK);
        let sensitivity = params.percent(SENSITIVITY);
        let failure_rate = params.percent(FAILURE_RATE);
        let latency_spike = params.percent(LATENCY_SPIKE);
        let desync = params.percent(DESYNC);
        let thermal_amt = params.percent(THERMAL);
        let recovery = params.percent(RECOVERY);

        let frames = block.frames();
        let channels = block.channels().min(self.channels.len());

        let mut energy = 0.0_f32;
        for ch in 0..channels {
            energy += block.channel(ch).iter().map(|x| x.abs()).sum::<f32>();
        }
        energy /= (channels * frames).max(1) as f32;

        let stress_target = (energy * (0.8 + 3.2 * sensitivity) + overclock * 0.35).clamp(0.0, 1.0);
        self.stress += (stress_target - self.stress) * lerp(0.25, 0.01, recovery);
        let rise = (overclock * 0.0012 + self.stress * 0.0018) * (0.35 + thermal_amt);
        let fall = 0.0003 + recovery * 0.0012;
        self.thermal = (self.thermal + rise - fall).clamp(0.0, 1.0);

        let fail = (failure_rate * (0.25 + 0.75 * self.stress) + self.thermal * 0.28).clamp(0.0, 0.85);
        let spike_max = ((2.0 + latency_spike * 180.0 + thermal_amt * 80.0) as usize).max(1);
        let base_desync = desync * 120.0;
        let hold_span = ((2.0 + fail * 24.0) as u32).max(2);
        let spike_chance = latency_spike * (0.01 + fail * 0.02);
        let drift_rate = f64::from(0.00007 + self.thermal * 0.00025);
        let drift_depth = 0.01 + self.thermal * 0.06;
        let drive = lerp(1.0, 1.9, overclock);

        for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
            let channel_desync = if ch % 2 == 1 {
                base_desync as usize
            } else {
                (base_desync as usize as f32 * 0.35) as usize
            };
            let ceiling = (spike_max + channel_desync.max(1)).min(state.delay.capacity() - 1).max(1);
            let nominal = 1 + channel_desync;

            for (i, sample) in block.channel_mut(ch).iter_mut().enumerate() {
                let mut x = *sample;

                if state.hold_remaining > 0 {
                    x = state.hold_value;
                    state.hold_remaining -= 1;
                } else if rng.chance(fail * 0.05) {
                    state.hold_value = x;
                    state.hold_remaining = 1 + rng.next_below(hold_span);
                }

                if rng.chance(fail * 0.03) {
                    x = 0.0;
                }

                if rng.chance(spike_chance) {
                    let span = (spike_max + channel_desync.max(1)) as u32;
                    state.read_offset = 1 + rng.next_below(span) as usize;
                } else if nominal > state.read_offset {
                    state.read_offset += 1;
                } else {
                    state.read_offset = state.read_offset.saturating_sub(1);
                }
                state.read_offset = state.read_offset.clamp(1, ceiling);

                state.delay.write(x);
                let mut y = state.delay.read_back(state.read_offset);

                let t = (self.elapsed + i as u64 + ch as u64 * 31) as f64;
                let drift = 1.0 + libm::sin(t * drift_rate) as f32 * drift_depth;
                y = libm::tanhf(y * drift * drive);

                *sample = y.clamp(-1.0, 1.0);
            }
        }

        self.elapsed += frames as u64;
    }
}
