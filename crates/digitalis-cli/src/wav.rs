//! Multichannel WAV reading and writing.
//!
//! Samples are kept de-interleaved so each channel can be handed to the
//! engine as its own slice. Integer formats are scaled to [-1, 1).

use anyhow::{Context, bail};
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// De-interleaved audio plus the format it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    /// One sample vector per channel, all the same length.
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Audio {
    /// Number of frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Read every channel of a WAV file.
pub fn read_wav(path: &Path) -> anyhow::Result<Audio> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &x) in out.iter_mut().zip(frame) {
            ch.push(x);
        }
    }

    Ok(Audio {
        channels: out,
        sample_rate: spec.sample_rate,
    })
}

/// Write `audio` at `bit_depth` (16 and 24 as PCM, 32 as float).
pub fn write_wav(path: &Path, audio: &Audio, bit_depth: u16) -> anyhow::Result<()> {
    if !matches!(bit_depth, 16 | 24 | 32) {
        bail!("unsupported bit depth {bit_depth} (expected 16, 24 or 32)");
    }
    let channel_count = u16::try_from(audio.channels.len()).context("too many channels")?;
    let spec = hound::WavSpec {
        channels: channel_count,
        sample_rate: audio.sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let max_val = (1i32 << (bit_depth.min(31) - 1)) as f32;
    for i in 0..audio.frames() {
        for ch in &audio.channels {
            let sample = ch[i];
            if bit_depth == 32 {
                writer.write_sample(sample)?;
            } else {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}
