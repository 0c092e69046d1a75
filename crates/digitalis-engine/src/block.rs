//! Multichannel view passed through the variant and post stages.

use alloc::vec::Vec;

use digitalis_core::rms;

/// `frames` samples of each working channel.
///
/// The engine owns one `Vec<f32>` per prepared channel, sized to the maximum
/// block. A `Block` borrows the first `frames` samples of some or all of them.
///
/// # Example
///
/// ```rust
/// use digitalis_engine::Block;
///
/// let mut buffers = vec![vec![0.5_f32; 8], vec![-0.5; 8]];
/// let mut block = Block::new(&mut buffers, 4);
/// assert_eq!(block.frames(), 4);
/// block.channel_mut(1)[0] = 0.0;
/// assert_eq!(block.channel(1), &[0.0, -0.5, -0.5, -0.5]);
/// ```
#[derive(Debug)]
pub struct Block<'a> {
    channels: &'a mut [Vec<f32>],
    frames: usize,
}

impl<'a> Block<'a> {
    /// Wrap `channels`, limited to `frames` samples (and to the shortest channel).
    pub fn new(channels: &'a mut [Vec<f32>], frames: usize) -> Self {
        let shortest = channels.iter().map(Vec::len).min().unwrap_or(0);
        Self {
            channels,
            frames: frames.min(shortest),
        }
    }

    /// Samples per channel.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// `true` when there is nothing to process.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames == 0 || self.channels.is_empty()
    }

    /// Samples of channel `ch`.
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.channels[ch][..self.frames]
    }

    /// Mutable samples of channel `ch`.
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        &mut self.channels[ch][..self.frames]
    }

    /// Samples `[start, start + len)` of channel `ch`, clamped to the block.
    pub fn range_mut(&mut self, ch: usize, start: usize, len: usize) -> &mut [f32] {
        let start = start.min(self.frames);
        let end = start.saturating_add(len).min(self.frames);
        &mut self.channels[ch][start..end]
    }

    /// Sample `i` of channel `ch`.
    #[inline]
    pub fn get(&self, ch: usize, i: usize) -> f32 {
        self.channels[ch][i]
    }

    /// Overwrite sample `i` of channel `ch`.
    #[inline]
    pub fn set(&mut self, ch: usize, i: usize, value: f32) {
        self.channels[ch][i] = value;
    }

    /// Mean absolute value across channels at frame `i`.
    #[inline]
    pub fn frame_energy(&self, i: usize) -> f32 {
        if self.channels.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.channels.iter().map(|c| c[i].abs()).sum();
        sum / self.channels.len() as f32
    }

    /// RMS over every sample of every channel.
    pub fn rms(&self) -> f32 {
        if self.frames == 0 || self.channels.is_empty() {
            return 0.0;
        }
        // channels share a length, so the overall mean square is the mean of
        // the per-channel ones
        let mean_square: f32 = self
            .channels
            .iter()
            .map(|ch| {
                let r = rms(&ch[..self.frames]);
                r * r
            })
            .sum::<f32>()
            / self.channels.len() as f32;
        libm::sqrtf(mean_square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_frames_limited_by_shortest_channel() {
        let mut buffers = vec![vec![0.0; 16], vec![0.0; 6]];
        let block = Block::new(&mut buffers, 10);
        assert_eq!(block.frames(), 6);
        assert_eq!(block.channels(), 2);
    }

    #[test]
    fn test_empty() {
        let mut buffers: Vec<Vec<f32>> = Vec::new();
        let block = Block::new(&mut buffers, 10);
        assert!(block.is_empty());
        assert_eq!(block.rms(), 0.0);
    }

    #[test]
    fn test_energy_and_rms() {
        let mut buffers = vec![vec![0.5; 4], vec![-0.5; 4]];
        let block = Block::new(&mut buffers, 4);
        assert!((block.frame_energy(0) - 0.5).abs() < 1e-6);
        assert!((block.rms() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rms_pools_channels() {
        let mut buffers = vec![vec![0.6; 8], vec![-0.8; 8]];
        let block = Block::new(&mut buffers, 8);
        assert!((block.rms() - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_range_mut_clamped() {
        let mut buffers = vec![vec![1.0; 8]];
        let mut block = Block::new(&mut buffers, 5);
        assert_eq!(block.range_mut(0, 3, 10).len(), 2);
        assert!(block.range_mut(0, 9, 1).is_empty());
    }
}
