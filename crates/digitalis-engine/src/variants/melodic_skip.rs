//! Melodic Skip Engine: a scratch looper over a long input memory.
//!
//! Every channel records into a circular memory of about 2.5 seconds. While
//! no segment is playing, each sample may trigger a jump (probability from
//! `jump_rate` and `skip`). A jump picks:
//!
//! - a playback rate from a semitone table, narrowed or widened by `melody`
//!   and `spread` (`rate = 2^(st / 12)`)
//! - a direction (`reverse` chance)
//! - a segment length around `seg_ms`, stretched by `melody`
//! - a read position a random distance back in the memory, never closer
//!   than one segment and never further than the memory minus a guard
//!
//! The segment is read with linear interpolation, lightly low-passed by
//! `blur`, and wobbled by two slow flutter oscillators plus occasional
//! direction flips and rate jumps.

use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, ParamScale, RandomSource, RingBuffer, lerp};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Skip amount (%).
pub const SKIP: usize = 0;
/// Jump rate (Hz).
pub const JUMP_RATE: usize = 1;
/// Segment length (ms).
pub const SEG_MS: usize = 2;
/// Melody (%): pitch range and segment stretch.
pub const MELODY: usize = 3;
/// Pitch spread (%).
pub const SPREAD: usize = 4;
/// Reverse chance (%).
pub const REVERSE: usize = 5;
/// Flutter (%).
pub const FLUTTER: usize = 6;
/// Blur (%).
pub const BLUR: usize = 7;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 8] = [
    ParamDescriptor::percent("Skip Amount", "Skip", 58.0).with_id(ParamId(1000), "skip"),
    ParamDescriptor::hertz("Jump Rate", "Jump", 0.2, 18.0, 5.0)
        .with_step(0.01)
        .with_scale(ParamScale::Power(1.0 / 0.35))
        .with_id(ParamId(1001), "jump_rate"),
    ParamDescriptor::time_ms("Segment Length", "Segment", 60.0, 2500.0, 280.0)
        .with_step(0.1)
        .with_scale(ParamScale::Power(1.0 / 0.4))
        .with_id(ParamId(1002), "seg_ms"),
    ParamDescriptor::percent("Melody", "Melody", 56.0).with_id(ParamId(1003), "melody"),
    ParamDescriptor::percent("Pitch Spread", "Spread", 48.0).with_id(ParamId(1004), "spread"),
    ParamDescriptor::percent("Reverse Chance", "Reverse", 22.0).with_id(ParamId(1005), "reverse"),
    ParamDescriptor::percent("Flutter", "Flutter", 16.0).with_id(ParamId(1006), "flutter"),
    ParamDescriptor::percent("Blur", "Blur", 24.0).with_id(ParamId(1007), "blur"),
];

/// Playback intervals a jump can land on, in semitones.
pub const SEMITONES: [i32; 15] = [-24, -19, -12, -9, -7, -5, -3, 0, 3, 5, 7, 9, 12, 19, 24];
const CENTER: usize = 7;
const MIN_SEGMENT: usize = 16;

#[derive(Debug, Clone)]
struct ChannelState {
    memory: RingBuffer,
    play_pos: f64,
    rate: f32,
    dir: f32,
    remaining: usize,
    blur: f32,
}

impl ChannelState {
    fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
            play_pos: 0.0,
            rate: 1.0,
            dir: 1.0,
            remaining: 0,
            blur: 0.0,
        }
    }

    fn reset(&mut self) {
        self.memory.clear();
        self.play_pos = 0.0;
        self.rate = 1.0;
        self.dir = 1.0;
        self.remaining = 0;
        self.blur = 0.0;
    }
}

/// The Melodic Skip Engine variant.
#[derive(Debug, Clone)]
pub struct MelodicSkip {
    sample_rate: f32,
    /// Samples processed since prepare; drives the flutter oscillators.
    elapsed: u64,
    channels: Vec<ChannelState>,
}

impl MelodicSkip {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            elapsed: 0,
            channels: Vec::new(),
        }
    }

    /// Samples left in the segment channel `ch` is playing (0 when idle).
    pub fn remaining(&self, ch: usize) -> usize {
        self.channels.get(ch).map_or(0, |c| c.remaining)
    }
}

impl Default for MelodicSkip {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for MelodicSkip {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        let capacity = 2048.max((2.5 * spec.sample_rate) as usize);
        self.channels = (0..spec.channels)
            .map(|_| ChannelState::new(capacity))
            .collect();
        self.elapsed = 0;
    }

    fn reset(&mut self) {
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
        let skip = params.percent(SKIP);
        let jump_rate = params.value(JUMP_RATE);
        let seg_ms = params.value(SEG_MS);
        let melody = params.percent(MELODY);
        let spread = params.percent(SPREAD);
        let reverse = params.percent(REVERSE);
        let flutter = params.percent(FLUTTER);
        let blur = params.percent(BLUR);

        let sr = self.sample_rate;
        let max_segment = 128.max((1.2 * sr) as usize);
        let seg_len = (libm::roundf(seg_ms * 0.001 * sr) as usize).clamp(MIN_SEGMENT, max_segment);
        let trigger = (jump_rate / sr * (0.2 + 0.8 * skip)).clamp(0.0, 1.0);
        let depth = libm::powf(skip, 0.65);
        let drive = lerp(1.0, 2.1, depth);
        let blur_pole = lerp(0.92, 0.28, blur);

        let span = (2 + libm::roundf(melody * (0.5 + spread) * 12.0) as usize).clamp(1, 14);
        let lowest = CENTER.saturating_sub(span);
        let highest = (CENTER + span).min(SEMITONES.len() - 1);

        let base_len = libm::roundf(seg_len as f32 * lerp(1.0, 2.6, melody)) as usize;

        let frames = block.frames();
        let channels = block.channels().min(self.channels.len());
        for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
            let capacity = state.memory.capacity();
            let back_min = seg_len.max((0.03 * sr) as usize);
            let back_max = (capacity - 2).min((back_min + 1).max((0.9 * sr) as usize));

            for (i, sample) in block.channel_mut(ch).iter_mut().enumerate() {
                let input = *sample;
                state.memory.write(input);

                let mut accent = 0.0;
                if state.remaining == 0 && rng.chance(trigger) {
                    let pick = lowest + rng.next_below((highest - lowest + 1) as u32) as usize;
                    state.rate = libm::exp2f(SEMITONES[pick] as f32 / 12.0);
                    state.dir = if rng.chance(reverse) { -1.0 } else { 1.0 };
                    state.remaining =
                        MIN_SEGMENT.max(base_len + rng.next_below(base_len.max(1) as u32) as usize);

                    let range = back_max.saturating_sub(back_min) + 1;
                    let back = (back_min + rng.next_below(range as u32) as usize).min(capacity - 1);
                    let write = state.memory.write_pos() as f64;
                    state.play_pos = state.memory.wrap_position(write - back as f64);

                    accent = rng.next_bipolar() * (0.06 + 0.18 * depth);
                }

                let mut y = input;
                if state.remaining > 0 {
                    let mut seg = state.memory.read_interpolated(state.play_pos);
                    state.blur = state.blur * blur_pole + seg * (1.0 - blur_pole);
                    seg = lerp(seg, state.blur, blur);
                    seg = (seg + accent).clamp(-1.0, 1.0);

                    if rng.chance(flutter * 0.018) {
                        state.dir = -state.dir;
                    }
                    if rng.chance(flutter * 0.01) {
                        state.rate = (state.rate * (0.6 + rng.next_f32() * 1.2)).clamp(0.35, 2.6);
                    }

                    let t = (self.elapsed + i as u64) as f64;
                    let wobble =
                        1.0 + libm::sin((t + ch as f64 * 59.0) * 0.0024) as f32 * flutter * 0.24;
                    let drift = libm::sin((t + ch as f64 * 13.0) * 0.019) as f32 * flutter * 0.42;
                    let advance = state.dir * state.rate * wobble + drift;
                    state.play_pos = state.memory.wrap_position(state.play_pos + f64::from(advance));
                    state.remaining -= 1;

                    y = lerp(input, seg, depth);
                    if rng.chance(skip * flutter * 0.01) {
                        y *= 0.2;
                    }
                }

                *sample = libm::tanhf(y * drive).clamp(-1.0, 1.0);
            }
        }

        self.elapsed += frames as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::test_util::{all_finite_bounded, render, spec, stereo_tone, values};

    fn prepared() -> MelodicSkip {
        let mut v = MelodicSkip::new();
        v.prepare(&spec());
        v
    }

    #[test]
    fn test_defaults_bounded() {
        let mut v = prepared();
        let out = render(&mut v, &PARAMS, &values(&PARAMS, &[]), 512, 200, 4);
        assert!(all_finite_bounded(&out, 1.0));
    }

    #[test]
    fn test_memory_sized_from_sample_rate() {
        let v = prepared();
        assert_eq!(v.channels[0].memory.capacity(), 120_000);
        let mut small = MelodicSkip::new();
        small.prepare(&ProcessSpec::stereo(400.0, 64));
        assert_eq!(small.channels[0].memory.capacity(), 2048);
    }

    #[test]
    fn test_zero_skip_is_plain_saturation() {
        let mut v = prepared();
        let vals = values(&PARAMS, &[(SKIP, 0.0)]);
        let out = render(&mut v, &PARAMS, &vals, 256, 20, 4);
        let dry = stereo_tone(256 * 20, 0);
        for (o, d) in out.iter().zip(&dry) {
            for (a, b) in o.iter().zip(d) {
                assert_eq!(*a, libm::tanhf(*b));
            }
        }
    }

    #[test]
    fn test_full_skip_jumps_and_stays_in_memory() {
        let mut v = prepared();
        let vals = values(&PARAMS, &[(SKIP, 100.0), (JUMP_RATE, 18.0), (FLUTTER, 100.0)]);
        let reader = ParamReader::new(&vals, &PARAMS);
        let mut rng = digitalis_core::FastRng::new(11);
        let mut jumped = false;
        for b in 0..400 {
            let mut buf = stereo_tone(256, b * 256);
            v.process(&mut Block::new(&mut buf, 256), &reader, &mut rng);
            jumped |= v.remaining(0) > 0;
            for state in &v.channels {
                let cap = state.memory.capacity() as f64;
                assert!((0.0..cap).contains(&state.play_pos));
                assert!((0.25..=4.0).contains(&state.rate));
            }
        }
        assert!(jumped);
    }

    #[test]
    fn test_reset_clears_segments() {
        let mut v = prepared();
        let vals = values(&PARAMS, &[(SKIP, 100.0), (JUMP_RATE, 18.0)]);
        render(&mut v, &PARAMS, &vals, 512, 100, 2);
        v.reset();
        assert_eq!(v.remaining(0), 0);
        assert_eq!(v.elapsed, 0);
        assert_eq!(v.channels[1].memory.write_pos(), 0);
    }
}
