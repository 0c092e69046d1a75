//! Classic Buffer Stutter: capture a slice, then repeat it.
//!
//! Each channel runs a small state machine:
//!
//! ```text
//! Idle --(interval expires, trigger)--> Capturing --(slice full)--> Playing
//!   ^                                                                  |
//!   +------------------------(repeats exhausted)-----------------------+
//! ```
//!
//! While capturing, the live input is ducked. While playing, the captured
//! slice (optionally reversed) replaces the input `repeats` times, exactly.
//! A slice is only played once it has been captured completely.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, ParamScale, RandomSource, lerp};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Amount (%): trigger probability and drive.
pub const AMOUNT: usize = 0;
/// Trigger rate (Hz).
pub const RATE_HZ: usize = 1;
/// Slice length (ms).
pub const SLICE_MS: usize = 2;
/// Repeats per capture (1–16).
pub const REPEATS: usize = 3;
/// Reverse chance (%).
pub const REVERSE: usize = 4;
/// Timing jitter (%).
pub const TIMING_JITTER: usize = 5;
/// Dry duck while capturing (%).
pub const DUCK: usize = 6;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 7] = [
    ParamDescriptor::percent("Amount", "Amount", 54.0).with_id(ParamId(900), "amount"),
    ParamDescriptor::hertz("Rate", "Rate", 0.25, 24.0, 6.0)
        .with_step(0.01)
        .with_scale(ParamScale::Power(1.0 / 0.35))
        .with_id(ParamId(901), "rate_hz"),
    ParamDescriptor::time_ms("Slice Length", "Slice", 10.0, 250.0, 52.0)
        .with_step(0.1)
        .with_scale(ParamScale::Power(1.0 / 0.4))
        .with_id(ParamId(902), "slice_ms"),
    ParamDescriptor::stepped("Repeats", "Repeats", 1.0, 16.0, 4.0).with_id(ParamId(903), "repeats"),
    ParamDescriptor::percent("Reverse Chance", "Reverse", 18.0).with_id(ParamId(904), "reverse"),
    ParamDescriptor::percent("Timing Jitter", "Jitter", 12.0).with_id(ParamId(905), "timing_jitter"),
    ParamDescriptor::percent("Dry Duck", "Duck", 34.0).with_id(ParamId(906), "duck"),
];

const MIN_SLICE: usize = 16;

/// Where a channel is in its capture/replay cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StutterPhase {
    /// Passing input through, counting down to the next trigger.
    Idle,
    /// Recording into the slice; `pos` samples so far.
    Capturing {
        /// Samples captured.
        pos: usize,
    },
    /// Replaying the slice.
    Playing {
        /// Read index inside the slice.
        pos: usize,
        /// Passes left, including the current one.
        remaining: u32,
    },
}

#[derive(Debug, Clone)]
struct ChannelState {
    slice: Vec<f32>,
    phase: StutterPhase,
    interval_counter: i64,
    reverse: bool,
}

impl ChannelState {
    fn reset(&mut self) {
        self.slice.fill(0.0);
        self.phase = StutterPhase::Idle;
        self.interval_counter = 1;
        self.reverse = false;
    }

    /// Pull a replay position back inside a slice that shrank to `len`.
    fn fit_slice(&mut self, len: usize) {
        if let StutterPhase::Playing { pos, remaining } = self.phase
            && pos >= len
        {
            self.phase = StutterPhase::Playing {
                pos: len - 1,
                remaining,
            };
        }
    }
}

/// The Classic Buffer Stutter variant.
#[derive(Debug, Clone)]
pub struct BufferStutter {
    sample_rate: f32,
    channels: Vec<ChannelState>,
}

impl BufferStutter {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            channels: Vec::new(),
        }
    }

    /// Current phase of channel `ch`.
    pub fn phase(&self, ch: usize) -> Option<StutterPhase> {
        self.channels.get(ch).map(|c| c.phase)
    }
}

impl Default for BufferStutter {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for BufferStutter {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        let capacity = 256.max((0.5 * spec.sample_rate) as usize);
        self.channels = vec![
            ChannelState {
                slice: vec![0.0; capacity],
                phase: StutterPhase::Idle,
                interval_counter: 1,
                reverse: false,
            };
            spec.channels
        ];
    }

    fn reset(&mut self) {
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
        let amount = params.percent(AMOUNT);
        let rate_hz = params.value(RATE_HZ);
        let slice_ms = params.value(SLICE_MS);
        let repeats = params.int(REPEATS).max(1) as u32;
        let reverse_chance = params.percent(REVERSE);
        let jitter = params.percent(TIMING_JITTER);
        let duck = lerp(1.0, 0.22, params.percent(DUCK));

        let sr = self.sample_rate;
        let trigger = lerp(0.04, 1.0, amount);
        let drive = lerp(1.0, 1.5, amount);

        let channels = block.channels().min(self.channels.len());
        for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
            let max_slice = state.slice.len();
            let slice_len =
                (libm::roundf(slice_ms * 0.001 * sr) as usize).clamp(MIN_SLICE, max_slice);
            state.fit_slice(slice_len);
            let base_interval =
                ((libm::roundf(sr / rate_hz.max(0.25)) as i64).max(slice_len as i64 + 1)).max(1);

            for sample in block.channel_mut(ch) {
                let input = *sample;
                let mut out = input;

                if state.phase == StutterPhase::Idle {
                    state.interval_counter -= 1;
                    if state.interval_counter <= 0 {
                        if rng.chance(trigger) {
                            state.phase = StutterPhase::Capturing { pos: 0 };
                            state.reverse = rng.chance(reverse_chance);
                        }
                        let mut interval = base_interval;
                        if jitter > 0.0 {
                            let offset = libm::roundf(
                                rng.next_bipolar() * jitter * 0.4 * base_interval as f32,
                            ) as i64;
                            interval = (base_interval + offset).max(slice_len as i64 + 1);
                        }
                        state.interval_counter = interval;
                    }
                }

                match state.phase {
                    StutterPhase::Idle => {}
                    StutterPhase::Capturing { pos } => {
                        state.slice[pos] = input;
                        out = input * duck;
                        state.phase = if pos + 1 >= slice_len {
                            StutterPhase::Playing {
                                pos: if state.reverse { slice_len - 1 } else { 0 },
                                remaining: repeats,
                            }
                        } else {
                            StutterPhase::Capturing { pos: pos + 1 }
                        };
                    }
                    StutterPhase::Playing { pos, remaining } => {
                        out = state.slice[pos];
                        let next = if state.reverse {
                            pos.checked_sub(1)
                        } else {
                            Some(pos + 1).filter(|&p| p < slice_len)
                        };
                        state.phase = match next {
                            Some(p) => StutterPhase::Playing { pos: p, remaining },
                            None if remaining > 1 => StutterPhase::Playing {
                                pos: if state.reverse { slice_len - 1 } else { 0 },
                                remaining: remaining - 1,
                            },
                            None => StutterPhase::Idle,
                        };
                    }
                }

                *sample = libm::tanhf(out * drive).clamp(-1.0, 1.0);
            }
        }
    }
}
