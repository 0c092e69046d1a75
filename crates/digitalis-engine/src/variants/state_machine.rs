//! Deterministic State Machine: the input decides where the effect goes.
//!
//! A rolling FNV-1a hash of the channel-averaged input (quantised to 16 bits)
//! is folded in every sample. When the dwell timer runs out or `hash_window`
//! samples have been hashed, the machine moves to a new state:
//!
//! - **Sequential**: `state + 1`
//! - **Hash**: `hash % state_count`
//! - **Threshold**: the hash state, but only while the input is loud enough
//!
//! `memory` randomly pulls the move back towards the current state. Each
//! state index `s` in `0..state_count` fixes a gain, crush step count, sine
//! fold and loop blend; the loop is a per-channel circular buffer of
//! `loop_ms` read one loop length behind the live input. Given the same input
//! and seed the state sequence is identical on every run.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, RandomSource, lerp, quantise};

use super::hash_sample;
use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Determinism (%).
pub const DETERMINISM: usize = 0;
/// Number of states (2–128).
pub const STATE_COUNT: usize = 1;
/// State dwell time (ms).
pub const STATE_DWELL: usize = 2;
/// Loop length (ms).
pub const LOOP_MS: usize = 3;
/// Hash window (samples).
pub const HASH_WINDOW: usize = 4;
/// Jump rule choice.
pub const JUMP_RULE: usize = 5;
/// Memory (%).
pub const MEMORY: usize = 6;

static RULE_LABELS: [&str; 3] = ["Sequential", "Hash", "Threshold"];

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 7] = [
    ParamDescriptor::percent("Determinism", "Determ", 62.0).with_id(ParamId(800), "determinism"),
    ParamDescriptor::stepped("State Count", "States", 2.0, 128.0, 16.0)
        .with_id(ParamId(801), "state_count"),
    ParamDescriptor::time_ms("State Dwell", "Dwell", 5.0, 1200.0, 120.0)
        .with_id(ParamId(802), "state_dwell"),
    ParamDescriptor::time_ms("Loop Length", "Loop", 5.0, 60.0, 28.0).with_id(ParamId(803), "loop_ms"),
    ParamDescriptor::stepped("Hash Window", "HashWin", 8.0, 1024.0, 96.0)
        .with_id(ParamId(804), "hash_window"),
    ParamDescriptor::choice("Jump Rule", "Rule", &RULE_LABELS, 1).with_id(ParamId(805), "jump_rule"),
    ParamDescriptor::percent("Memory", "Memory", 40.0).with_id(ParamId(806), "memory"),
];

const HASH_SEED: u32 = 2_166_136_261;
const STATE_SCRAMBLE: u32 = 2_654_435_761;
const MIN_LOOP: usize = 16;

/// How the next state is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpRule {
    /// Step through states in order.
    Sequential,
    /// Jump to the hash-selected state.
    Hash,
    /// Jump to the hash-selected state only on loud input.
    Threshold,
}

impl JumpRule {
    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Sequential,
            1 => Self::Hash,
            _ => Self::Threshold,
        }
    }
}

#[derive(Debug, Clone)]
struct LoopBuffer {
    data: Vec<f32>,
    pos: usize,
}

/// The Deterministic State Machine variant.
#[derive(Debug, Clone)]
pub struct DeterministicMachine {
    sample_rate: f32,
    hash: u32,
    hash_counter: usize,
    samples_to_next: i64,
    state: usize,
    smoother: f32,
    loop_len: usize,
    loops: Vec<LoopBuffer>,
}

impl DeterministicMachine {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            hash: HASH_SEED,
            hash_counter: 0,
            samples_to_next: 0,
            state: 0,
            smoother: 0.0,
            loop_len: MIN_LOOP,
            loops: Vec::new(),
        }
    }

    /// Current state index.
    pub fn state(&self) -> usize {
        self.state
    }

    fn capacity(&self) -> usize {
        self.loops.first().map_or(0, |l| l.data.len())
    }

    fn set_loop_len(&mut self, len: usize) {
        if len == self.loop_len {
            return;
        }
        self.loop_len = len;
        for l in &mut self.loops {
            l.data.fill(0.0);
            l.pos = 0;
        }
    }

    fn advance<R: RandomSource>(
        &mut self,
        mono: f32,
        rule: JumpRule,
        state_count: usize,
        determinism: f32,
        memory: f32,
        rng: &mut R,
    ) {
        let hashed = self.hash as usize % state_count;
        let mut next = match rule {
            JumpRule::Sequential => (self.state + 1) % state_count,
            JumpRule::Hash => hashed,
            JumpRule::Threshold if mono.abs() > 0.15 + determinism * 0.35 => hashed,
            JumpRule::Threshold => self.state,
        };
        if rng.chance(memory) {
            next = libm::roundf(lerp(next as f32, self.state as f32, memory)) as usize;
        }
        self.state = next.min(state_count - 1);
        self.hash_counter = 0;
        self.hash ^= (self.state as u32).wrapping_mul(STATE_SCRAMBLE);
    }
}

impl Default for DeterministicMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for DeterministicMachine {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        let capacity = 64.max((0.08 * spec.sample_rate) as usize);
        self.loops = vec![
            LoopBuffer {
                data: vec![0.0; capacity],
                pos: 0,
            };
            spec.channels
        ];
        self.reset();
    }

    fn reset(&mut self) {
        self.hash = HASH_SEED;
        self.hash_counter = 0;
        self.samples_to_next = 0;
        self.state = 0;
        self.smoother = 0.0;
        self.loop_len = MIN_LOOP;
        for l in &mut self.loops {
            l.data.fill(0.0);
            l.pos = 0;
        }
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        let determinism = params.percent(DETERMINISM);
        let state_count = params.int(STATE_COUNT).max(2) as usize;
        let dwell_ms = params.value(STATE_DWELL);
        let loop_ms = params.value(LOOP_MS);
        let hash_window = params.int(HASH_WINDOW).max(8) as usize;
        let rule = JumpRule::from_index(params.choice(JUMP_RULE));
        let memory = params.percent(MEMORY);

        let sr = self.sample_rate;
        let longest = MIN_LOOP.max((0.08 * sr) as usize).min(self.capacity().max(MIN_LOOP));
        let wanted = libm::roundf(loop_ms * 0.001 * sr) as usize;
        self.set_loop_len(wanted.clamp(MIN_LOOP, longest));
        let dwell = (libm::roundf(dwell_ms * 0.001 * sr) as i64).max(1);
        let drive = lerp(1.0, 2.2, determinism);
        let loop_len = self.loop_len;

        let channels = block.channels().min(self.loops.len());
        for i in 0..block.frames() {
            let mono = if channels == 0 {
                0.0
            } else {
                (0..channels).map(|ch| block.get(ch, i)).sum::<f32>() / channels as f32
            };

            self.hash = hash_sample(self.hash, mono);
            self.hash_counter += 1;
            self.samples_to_next -= 1;
            if self.samples_to_next <= 0 || self.hash_counter >= hash_window {
                self.advance(mono, rule, state_count, determinism, memory, rng);
                self.samples_to_next = dwell;
            }

            let norm = self.state as f32 / (state_count - 1).max(1) as f32;
            self.smoother += (lerp(0.45, 1.65, norm) - self.smoother) * 0.015;
            let crush = (1024.0 - (determinism * 700.0 + norm * 240.0)).max(8.0);
            let gate = if norm > 0.45 { 1.0 } else { 0.0 };
            let blend = (determinism * (0.25 + 0.75 * gate)).clamp(0.0, 1.0);
            let fold = lerp(0.8, 2.5, norm);
            let levels = (2 + self.state % 24) as f32;

            for ch in 0..channels {
                let input = block.get(ch, i);
                let buffer = &mut self.loops[ch];
                if buffer.pos >= loop_len {
                    buffer.pos = 0;
                }
                let looped = buffer.data[buffer.pos];
                buffer.data[buffer.pos] = input;
                buffer.pos = (buffer.pos + 1) % loop_len;

                let mut y = lerp(input, looped, blend);
                y = quantise(y * self.smoother, crush);
                y = libm::sinf(y * core::f32::consts::PI * fold);
                y = quantise(y, levels);

                block.set(ch, i, libm::tanhf(y * drive).clamp(-1.0, 1.0));
            }
        }
    }
}
