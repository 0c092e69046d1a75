//! Streaming Artifact Generator: coarse stand-ins for lossy codecs on a bad link.
//!
//! The signal is cut into frames of `64 + 384 * artifact` samples. Each frame
//! may be lost (packet loss, optionally in bursts); lost samples are concealed
//! by repeating the last output or by low-level noise. Every sample then goes
//! through one of four codec flavours:
//!
//! | Codec | Texture |
//! |-------|---------|
//! | MP3   | masking-scaled requantisation into a one-pole low-pass |
//! | AAC   | lighter requantisation with smearing |
//! | Opus  | requantisation plus level-dependent wobble |
//! | GSM   | narrow low-pass, very coarse steps |
//!
//! followed by a smear follower, an occasional pre-echo leaked into the
//! preceding samples on transients, and a tanh stage. In Cycle and Random
//! modes the codec changes every `switch_ms`.

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{ParamDescriptor, ParamId, ParamUnit, RandomSource, lerp, quantise};

use crate::{Block, ParamReader, ProcessSpec, Variant};

/// Artifact amount (%).
pub const ARTIFACT: usize = 0;
/// Nominal bitrate (kbps).
pub const BITRATE: usize = 1;
/// Masking (%).
pub const MASKING: usize = 2;
/// Smear (%).
pub const SMEAR: usize = 3;
/// Codec mode choice.
pub const CODEC_MODE: usize = 4;
/// Codec switch interval (ms).
pub const SWITCH_MS: usize = 5;
/// Packet loss probability per frame (%).
pub const PACKET_LOSS: usize = 6;
/// Burstiness of losses (%).
pub const BURST: usize = 7;
/// Pre-echo (%).
pub const PREECHO: usize = 8;

static MODE_LABELS: [&str; 3] = ["Fixed MP3", "Cycle", "Random"];

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 9] = [
    ParamDescriptor::percent("Artifact", "Artifact", 56.0).with_id(ParamId(500), "artifact"),
    ParamDescriptor::stepped("Bitrate", "Bitrate", 8.0, 320.0, 96.0)
        .with_unit(ParamUnit::Kbps)
        .with_id(ParamId(501), "bitrate"),
    ParamDescriptor::percent("Masking", "Masking", 64.0).with_id(ParamId(502), "masking"),
    ParamDescriptor::percent("Smear", "Smear", 42.0).with_id(ParamId(503), "smear"),
    ParamDescriptor::choice("Codec Mode", "Codec", &MODE_LABELS, 1).with_id(ParamId(504), "codec_mode"),
    ParamDescriptor::time_ms("Switch Rate", "Switch", 40.0, 1200.0, 220.0)
        .with_id(ParamId(505), "switch_ms"),
    ParamDescriptor::percent("Packet Loss", "Loss", 18.0).with_id(ParamId(506), "packet_loss"),
    ParamDescriptor::percent("Burstiness", "Burst", 38.0).with_id(ParamId(507), "burst"),
    ParamDescriptor::percent("Pre Echo", "PreEcho", 26.0).with_id(ParamId(508), "preecho"),
];

/// Codec flavour applied to the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Heavy masking, low-passed.
    Mp3,
    /// Cleaner, smeared.
    Aac,
    /// Smooth core, wobbling.
    Opus,
    /// Narrow and coarse.
    Gsm,
}

impl Codec {
    const ALL: [Self; 4] = [Self::Mp3, Self::Aac, Self::Opus, Self::Gsm];

    fn index(self) -> usize {
        match self {
            Self::Mp3 => 0,
            Self::Aac => 1,
            Self::Opus => 2,
            Self::Gsm => 3,
        }
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % 4]
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    last_output: f32,
    envelope: f32,
    tone: f32,
    smear: f32,
}

/// The Streaming Artifact Generator variant.
#[derive(Debug, Clone)]
pub struct StreamingArtifact {
    sample_rate: f32,
    codec: Codec,
    codec_countdown: i64,
    loss_burst_remaining: u32,
    channels: Vec<ChannelState>,
}

impl StreamingArtifact {
    /// Unprepared instance.
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            codec: Codec::Mp3,
            codec_countdown: 0,
            loss_burst_remaining: 0,
            channels: Vec::new(),
        }
    }

    /// Codec currently in use.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    fn update_codec<R: RandomSource>(
        &mut self,
        mode: usize,
        switch_samples: i64,
        elapsed: i64,
        rng: &mut R,
    ) {
        if mode == 0 {
            self.codec = Codec::Mp3;
            self.codec_countdown = switch_samples;
            return;
        }
        self.codec_countdown -= elapsed;
        if self.codec_countdown <= 0 {
            self.codec = if mode == 1 {
                self.codec.next()
            } else {
                Codec::ALL[rng.next_below(4) as usize]
            };
            self.codec_countdown = switch_samples;
        }
    }
}

impl Default for StreamingArtifact {
    fn default() -> Self {
        Self::new()
    }
}

impl Variant for StreamingArtifact {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.channels = vec![ChannelState::default(); spec.channels];
        self.reset();
    }

    fn reset(&mut self) {
        self.codec = Codec::Mp3;
        self.codec_countdown = 0;
        self.loss_burst_remaining = 0;
        self.channels.fill(ChannelState::default());
    }

    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        let artifact = params.percent(ARTIFACT);
        let bitrate = params.value(BITRATE);
        let masking = params.percent(MASKING);
        let smear = params.percent(SMEAR);
        let mode = params.choice(CODEC_MODE);
        let switch_ms = params.value(SWITCH_MS);
        let packet_loss = params.percent(PACKET_LOSS);
        let burst = params.percent(BURST);
        let preecho = params.percent(PREECHO);

        let frames = block.frames();
        let frame_size = (libm::roundf(64.0 + artifact * 384.0) as usize).clamp(16, 1024);
        let switch_samples =
            (libm::roundf(switch_ms * 0.001 * self.sample_rate) as i64).max(1);
        self.update_codec(mode, switch_samples, frames as i64, rng);

        let octaves = lerp(3.0, 12.0, (bitrate - 8.0) / 312.0);
        let crush = libm::powf(2.0, octaves).clamp(8.0, 4096.0);
        let conceal_noise = lerp(0.0, 0.04, masking);
        let smear_coeff = lerp(0.45, 0.03, smear);
        let drive = lerp(1.0, 2.1, artifact);
        let codec = self.codec;

        let channels = block.channels().min(self.channels.len());
        let mut start = 0;
        while start < frames {
            let len = frame_size.min(frames - start);

            let mut lost = false;
            if self.loss_burst_remaining > 0 {
                lost = true;
                self.loss_burst_remaining -= 1;
            } else if rng.chance(packet_loss) {
                lost = true;
                if rng.chance(burst) {
                    let span = ((2.0 + burst * 12.0) as u32).max(2);
                    self.loss_burst_remaining = 1 + rng.next_below(span);
                }
            }

            for (ch, state) in self.channels[..channels].iter_mut().enumerate() {
                let frame = block.range_mut(ch, start, len);
                for i in 0..frame.len() {
                    let mut x = frame[i];

                    if lost {
                        x = if rng.chance(0.5) {
                            state.last_output
                        } else {
                            rng.next_bipolar() * conceal_noise
                        };
                    }

                    let mag = x.abs();
                    state.envelope = if mag > state.envelope {
                        0.6 * mag + 0.4 * state.envelope
                    } else {
                        0.995 * state.envelope + 0.005 * mag
                    };

                    match codec {
                        Codec::Mp3 => {
                            x = quantise(x, crush * lerp(1.0, 0.12, masking));
                            state.tone += (x - state.tone) * lerp(0.08, 0.02, masking);
                            x = state.tone;
                        }
                        Codec::Aac => {
                            x = quantise(x, crush * lerp(1.0, 0.35, masking));
                            state.smear = lerp(x, state.smear, 0.35 + smear * 0.5);
                            x = lerp(x, state.smear, 0.35);
                        }
                        Codec::Opus => {
                            x = quantise(x, crush * 0.75);
                            x += rng.next_bipolar()
                                * (0.008 + 0.018 * masking)
                                * (0.4 + 0.6 * state.envelope);
                        }
                        Codec::Gsm => {
                            state.tone += (x - state.tone) * 0.05;
                            x = quantise(state.tone, (crush * 0.2).max(12.0));
                        }
                    }

                    state.smear += (x - state.smear) * smear_coeff;
                    x = lerp(x, state.smear, smear * 0.75);

                    if preecho > 0.0
                        && i > 4
                        && state.envelope > 0.25
                        && rng.chance(preecho * 0.04)
                    {
                        for t in 1..=i.min(8) {
                            let leak = preecho * 0.09 / t as f32;
                            frame[i - t] = (frame[i - t] + x * leak).clamp(-1.0, 1.0);
                        }
                    }

                    x = libm::tanhf(x * drive);
                    frame[i] = x;
                    state.last_output = x;
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

    fn prepared() -> StreamingArtifact {
        let mut v = StreamingArtifact::new();
        v.prepare(&spec());
        v
    }

    #[test]
    fn test_defaults_bounded() {
        let mut v = prepared();
        let out = render(&mut v, &PARAMS, &values(&PARAMS, &[]), 512, 12, 5);
        assert!(all_finite_bounded(&out, 1.0));
    }

    #[test]
    fn test_fixed_mode_stays_mp3() {
        let mut v = prepared();
        let vals = values(&PARAMS, &[(CODEC_MODE, 0.0), (SWITCH_MS, 40.0)]);
        render(&mut v, &PARAMS, &vals, 512, 20, 5);
        assert_eq!(v.codec(), Codec::Mp3);
    }

    #[test]
    fn test_cycle_advances_by_elapsed_samples() {
        let mut v = prepared();
        let mut rng = FastRng::new(1);
        // first call switches immediately, then every 1000 samples
        v.update_codec(1, 1000, 256, &mut rng);
        assert_eq!(v.codec(), Codec::Aac);
        for _ in 0..3 {
            v.update_codec(1, 1000, 256, &mut rng);
        }
        assert_eq!(v.codec(), Codec::Aac);
        v.update_codec(1, 1000, 256, &mut rng);
        assert_eq!(v.codec(), Codec::Opus);
    }

    #[test]
    fn test_total_loss_conceals() {
        // every frame lost, concealment noise only from masking
        let vals = values(
            &PARAMS,
            &[(PACKET_LOSS, 100.0), (MASKING, 0.0), (PREECHO, 0.0), (CODEC_MODE, 0.0)],
        );
        let mut v = prepared();
        let out = render(&mut v, &PARAMS, &vals, 512, 2, 5);
        assert!(out.iter().flatten().all(|x| x.abs() < 1e-6));
    }
}
