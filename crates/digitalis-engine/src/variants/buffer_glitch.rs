//! Buffer Glitch Engine: a host that keeps getting its buffer sizes wrong.
//!
//! The block is cut into chunks around `base_block` samples, each size
//! jittered by up to ±90 %. Per chunk one reorder mode is drawn for all
//! channels:
//!
//! | Mode      | Output                                   | Stored as previous |
//! |-----------|------------------------------------------|--------------------|
//! | none      | the chunk                                | the chunk          |
//! | swap      | the previous chunk                       | the chunk          |
//! | reverse   | the chunk, backwards                     | what was output    |
//! | duplicate | the previous chunk again                 | what was output    |
//!
//! Before reordering, the tail of the chunk is dropped to silence and its
//! head is crossfaded against the end of the previous chunk (`seam`). A
//! lookahead limiter with a stress-dependent threshold runs over the whole
//! block afterwards; `look_fail` makes it misread its own envelope and
//! occasionally mute a sample.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, RandomSource, lerp};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Engine stress (%).
pub const STRESS: usize = 0;
/// Base block size choice.
pub const BASE_BLOCK: usize = 1;
/// Block size jitter (%).
pub const BLOCK_JITTER: usize = 2;
/// Seam error (%).
pub const SEAM: usize = 3;
/// Tail drop (%).
pub const TAIL_DROP: usize = 4;
/// Reorder probability (%).
pub const REORDER: usize = 5;
/// Lookahead failure (%).
pub const LOOK_FAIL: usize = 6;

static BLOCK_LABELS: [&str; 6] = ["16", "32", "64", "128", "256", "512"];
const BLOCK_SIZES: [usize; 6] = [16, 32, 64, 128, 256, 512];

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 7] = [
    ParamDescriptor::percent("Engine Stress", "Stress", 52.0).with_id(ParamId(300), "stress"),
    ParamDescriptor::choice("Base Block", "Block", &BLOCK_LABELS, 2).with_id(ParamId(301), "base_block"),
    ParamDescriptor::percent("Block Jitter", "Jitter", 62.0).with_id(ParamId(302), "block_jitter"),
    ParamDescriptor::percent("Seam Error", "Seam", 42.0).with_id(ParamId(303), "seam"),
    ParamDescriptor::percent("Tail Drop", "Tail", 28.0).with_id(ParamId(304), "tail_drop"),
    ParamDescriptor::percent("Reorder", "Reorder", 46.0).with_id(ParamId(305), "reorder"),
    ParamDescriptor::percent("Lookahead Fail", "LookFail", 38.0).with_id(ParamId(306), "look_fail"),
];

/// What happens to a chunk relative to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    /// Chunk passes in order.
    None,
    /// Previous chunk is output in place of this one.
    Swap,
    /// Chunk is played backwards.
    Reverse,
    /// Previous chunk is output again.
    Duplicate,
}

impl Reorder {
    fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Swap,
            2 => Self::Reverse,
            3 => Self::Duplicate,
            _ => Self::None,
        }
    }
}

/// Replace the head of `chunk` with the previous chunk for swap and
/// duplicate, then update `prev` to what should be remembered.
fn reorder_chunk(mode: Reorder, chunk: &mut [f32], prev: &mut [f32], prev_len: usize) {
    let overlap = chunk.len().min(prev_len);
    match mode {
        Reorder::Swap => {
            for (c, p) in chunk[..overlap].iter_mut().zip(&mut prev[..overlap]) {
                core::mem::swap(c, p);
            }
            // the live chunk now sits in prev[..overlap]; keep its tail too
            let len = chunk.len();
            prev[overlap..len].copy_from_slice(&chunk[overlap..len]);
        }
        Reorder::Duplicate => {
            chunk[..overlap].copy_from_slice(&prev[..overlap]);
            prev[..chunk.len()].copy_from_slice(chunk);
        }
        Reorder::None | Reorder::Reverse => prev[..chunk.len()].copy_from_slice(chunk),
    }
}

#[derive(Debug, Clone)]
struct ChannelState {
    prev: Vec<f32>,
    scratch: Vec<f32>,
    envelope: f32,
}

/// The Buffer Glitch Engine variant.
#[derive(Debug, Clone)]
pub struct BufferGlitch {
    capacity: usize,
    /// Length of the stored previous chunk, 0 before the first chunk.
    prev_len: usize,
    channels: Vec<ChannelState>,
}

impl BufferGlitch {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            capacity: 0,
            prev_len: 0,
            channels: Vec::new(),
        }
    }
}

impl Default for BufferGlitch {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for BufferGlitch {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.capacity = 32.max(spec.max_block_size);
        self.prev_len = 0;
        self.channels = vec![
            ChannelState {
                prev: vec![0.0; self.capacity],
                scratch: vec![0.0; self.capacity],
                envelope: 0.0,
            };
            spec.channels
        ];
    }

    fn reset(&mut self) {
        self.prev_len = 0;
        for state in &mut self.channels {
            state.prev.fill(0.0);
            state.envelope = 0.0;
        }
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        let stress = params.percent(STRESS);
        let base_block = BLOCK_SIZES[params.choice(BASE_BLOCK).min(BLOCK_SIZES.len() - 1)];
        let jitter = params.percent(BLOCK_JITTER);
        let seam = params.percent(SEAM);
        let tail_drop = params.percent(TAIL_DROP);
        let reorder = params.percent(REORDER);
        let look_fail = params.percent(LOOK_FAIL);

        let frames = block.frames();
        let channels = block.channels().min(self.channels.len());
        if self.capacity == 0 {
            return;
        }

        let mut start = 0;
        while start < frames {
            let mut size = base_block;
            if jitter > 0.0 {
                let mul = 1.0 + rng.next_bipolar() * jitter * 0.9;
                size = (libm::roundf(base_block as f32 * mul) as usize).clamp(8, 1024);
            }
            let chunk_len = size.min(frames - start).min(self.capacity);

            let mode = if rng.chance(reorder * 0.65) {
                Reorder::from_index(rng.next_below(4))
            } else {
                Reorder::None
            };

            let drop = libm::roundf(chunk_len as f32 * tail_drop * lerp(0.15, 0.95, stress)) as usize;
            let drop = drop.min(chunk_len - 1);

            for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
                let chunk = &mut state.scratch[..chunk_len];
                chunk.copy_from_slice(block.range_mut(ch, start, chunk_len));

                if mode == Reorder::Reverse {
                    chunk.reverse();
                }
                chunk[chunk_len - drop..].fill(0.0);

                if self.prev_len > 0 && seam > 0.0 {
                    let span = chunk_len.min((libm::roundf(1.0 + seam * 10.0) as usize).max(1));
                    let denom = span.saturating_sub(1).max(1) as f32;
                    for (i, x) in chunk[..span].iter_mut().enumerate() {
                        let w = i as f32 / denom;
                        let src = (self.prev_len + i).saturating_sub(span).min(self.prev_len - 1);
                        *x = lerp(state.prev[src], *x, w + seam * 0.25);
                    }
                }

                reorder_chunk(mode, chunk, &mut state.prev, self.prev_len);
                block.range_mut(ch, start, chunk_len).copy_from_slice(chunk);
            }

            self.prev_len = chunk_len;
            start += chunk_len;
        }

        let threshold = lerp(0.95, 0.18, stress);
        let attack = lerp(0.01, 0.45, stress);
        let release = lerp(0.9985, 0.94, stress);
        let drive = lerp(1.0, 1.6, stress);

        for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
            for sample in block.channel_mut(ch) {
                let x = *sample;
                let mag = x.abs();
                state.envelope = if mag > state.envelope {
                    attack * mag + (1.0 - attack) * state.envelope
                } else {
                    release * state.envelope + (1.0 - release) * mag
                };

                let mut env = state.envelope;
                if rng.chance(look_fail * 0.08) {
                    env *= if rng.next_bool() { 0.35 } else { 1.8 };
                }

                let gain = if env > threshold {
                    threshold / (env + 1.0e-6)
                } else {
                    1.0
                };
                let mut y = x * gain.clamp(0.05, 1.0);
                if rng.chance(look_fail * stress * 0.015) {
                    y = 0.0;
                }
                *sample = libm::tanhf(y * drive).clamp(-1.0, 1.0);
            }
        }
    }
}
