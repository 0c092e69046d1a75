//! Variant implementations, one module each.
//!
//! Every module exports its parameter table as `PARAMS` together with index
//! constants into it, and one type implementing [`Variant`](crate::Variant).

pub mod automation_quantiser;
pub mod buffer_glitch;
pub mod float_collapse;
pub mod melodic_skip;
pub mod nyquist;
pub mod overclock;
pub mod spectral_brutalist;
pub mod state_machine;
pub mod streaming_artifact;
pub mod stutter;

pub use automation_quantiser::AutomationQuantiser;
pub use buffer_glitch::BufferGlitch;
pub use float_collapse::FloatCollapse;
pub use melodic_skip::MelodicSkip;
pub use nyquist::NyquistDestroyer;
pub use overclock::OverclockFailure;
pub use spectral_brutalist::SpectralBrutalist;
pub use state_machine::DeterministicMachine;
pub use streaming_artifact::StreamingArtifact;
pub use stutter::BufferStutter;

/// Option labels for power-of-two choice lists.
pub(crate) static POW2_1_128: [&str; 8] = ["1", "2", "4", "8", "16", "32", "64", "128"];

/// Fold a sample into an FNV-1a style running hash.
///
/// The sample is clamped to ±1 and quantised to 16 bits first, so the hash
/// only sees what a 16-bit capture would.
#[inline]
pub(crate) fn hash_sample(hash: u32, x: f32) -> u32 {
    let q = libm::roundf(x.clamp(-1.0, 1.0) * 32767.0) as i32;
    (hash ^ q as u32).wrapping_mul(16_777_619)
}

#[cfg(test)]
pub(crate) mod test_util {
    //! Helpers shared by the variant unit tests.

    use alloc::vec;
    use alloc::vec::Vec;

    use digitalis_core::{FastRng, ParamDescriptor};

    use crate::{Block, ParamReader, ProcessSpec, Variant};

    pub const SR: f32 = 48_000.0;

    pub fn spec() -> ProcessSpec {
        ProcessSpec::stereo(SR, 512)
    }

    /// Defaults of `params` with selected overrides.
    pub fn values(params: &[ParamDescriptor], overrides: &[(usize, f32)]) -> Vec<f32> {
        let mut v: Vec<f32> = params.iter().map(|d| d.default).collect();
        for &(i, x) in overrides {
            v[i] = x;
        }
        v
    }

    /// Two channels of a 220 Hz / 330 Hz sine pair at 0.4 peak.
    pub fn stereo_tone(frames: usize, offset: usize) -> Vec<Vec<f32>> {
        (0..2)
            .map(|ch| {
                let f = if ch == 0 { 220.0 } else { 330.0 };
                (0..frames)
                    .map(|i| {
                        let t = (i + offset) as f32 / SR;
                        0.4 * libm::sinf(core::f32::consts::TAU * f * t)
                    })
                    .collect()
            })
            .collect()
    }

    /// Process `blocks` consecutive blocks of the test tone and return the
    /// concatenated output per channel.
    pub fn render<V: Variant>(
        variant: &mut V,
        params: &[ParamDescriptor],
        values: &[f32],
        block: usize,
        blocks: usize,
        seed: u32,
    ) -> Vec<Vec<f32>> {
        let mut rng = FastRng::new(seed);
        let reader = ParamReader::new(&values, params);
        let mut out = vec![Vec::new(), Vec::new()];
        for b in 0..blocks {
            let mut buf = stereo_tone(block, b * block);
            let mut view = Block::new(&mut buf, block);
            variant.process(&mut view, &reader, &mut rng);
            for (o, c) in out.iter_mut().zip(buf) {
                o.extend(c);
            }
        }
        out
    }

    pub fn all_finite_bounded(out: &[Vec<f32>], bound: f32) -> bool {
        out.iter().flatten().all(|x| x.is_finite() && x.abs() <= bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_sample_is_order_sensitive() {
        let a = hash_sample(hash_sample(2_166_136_261, 0.5), -0.25);
        let b = hash_sample(hash_sample(2_166_136_261, -0.25), 0.5);
        assert_ne!(a, b);
        assert_eq!(hash_sample(7, 3.0), hash_sample(7, 1.0));
    }
}
