//! Prepare-time processing configuration.

use crate::EngineError;

/// Sample rate, block ceiling and channel count an engine is prepared for.
///
/// All state buffers are sized from these values in
/// [`Engine::prepare`](crate::Engine::prepare). Hosts may deliver shorter
/// blocks or fewer channels afterwards; longer blocks are split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Largest block the engine processes in one pass.
    pub max_block_size: usize,
    /// Number of channels with per-channel state.
    pub channels: usize,
}

impl ProcessSpec {
    /// Stereo spec at the given rate and block size.
    pub const fn stereo(sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            channels: 2,
        }
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(self.max_block_size));
        }
        if self.channels == 0 {
            return Err(EngineError::InvalidChannelCount(self.channels));
        }
        Ok(())
    }

    /// `seconds` expressed in samples at this rate, rounded down.
    #[inline]
    pub fn samples_for(&self, seconds: f32) -> usize {
        let n = seconds * self.sample_rate;
        if n > 0.0 { n as usize } else { 0 }
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::stereo(48_000.0, 512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ProcessSpec::default().validate().is_ok());
        assert!(matches!(
            ProcessSpec::stereo(f32::NAN, 64).validate(),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert_eq!(
            ProcessSpec::stereo(0.0, 64).validate(),
            Err(EngineError::InvalidSampleRate(0.0))
        );
        assert_eq!(
            ProcessSpec::stereo(48_000.0, 0).validate(),
            Err(EngineError::InvalidBlockSize(0))
        );
        let mono = ProcessSpec {
            channels: 0,
            ..ProcessSpec::default()
        };
        assert_eq!(mono.validate(), Err(EngineError::InvalidChannelCount(0)));
    }

    #[test]
    fn test_samples_for() {
        let spec = ProcessSpec::stereo(48_000.0, 256);
        assert_eq!(spec.samples_for(0.5), 24_000);
        assert_eq!(spec.samples_for(-1.0), 0);
    }
}
