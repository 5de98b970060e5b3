//! Interleaved PCM audio buffers.

use reelcut_common::clock::secs_to_samples;
use reelcut_common::error::{ReelcutError, ReelcutResult};

/// Fixed output audio format that every clip is resampled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTarget {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioTarget {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

impl Default for AudioTarget {
    fn default() -> Self {
        Self::new(48000, 2)
    }
}

/// Interleaved `f32` PCM samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,

    /// `frames * channels` samples, channel-interleaved.
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// A buffer of silence lasting `duration_secs`.
    pub fn silent(target: AudioTarget, duration_secs: f64) -> Self {
        let frames = secs_to_samples(duration_secs, target.sample_rate);
        Self::silent_frames(target, frames)
    }

    /// A buffer of `frames` silent sample frames.
    pub fn silent_frames(target: AudioTarget, frames: usize) -> Self {
        Self {
            sample_rate: target.sample_rate,
            channels: target.channels,
            samples: vec![0.0; frames * target.channels as usize],
        }
    }

    /// Wrap interleaved samples. The sample count must divide evenly into frames.
    pub fn from_interleaved(target: AudioTarget, samples: Vec<f32>) -> ReelcutResult<Self> {
        if target.channels == 0 || samples.len() % target.channels as usize != 0 {
            return Err(ReelcutError::decode(format!(
                "{} samples do not form whole {}-channel frames",
                samples.len(),
                target.channels
            )));
        }
        Ok(Self {
            sample_rate: target.sample_rate,
            channels: target.channels,
            samples,
        })
    }

    pub fn target(&self) -> AudioTarget {
        AudioTarget::new(self.sample_rate, self.channels)
    }

    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|s| *s == 0.0)
    }

    /// Sum `other` into this buffer starting at frame `offset_frames`.
    ///
    /// Frames of `other` that fall past the end of this buffer are dropped.
    /// Both buffers must share sample rate and channel count.
    pub fn add_at(&mut self, other: &AudioBuffer, offset_frames: usize) -> ReelcutResult<()> {
        if other.target() != self.target() {
            return Err(ReelcutError::invariant(format!(
                "cannot mix {}Hz/{}ch audio into a {}Hz/{}ch buffer",
                other.sample_rate, other.channels, self.sample_rate, self.channels
            )));
        }
        let channels = self.channels as usize;
        let start = offset_frames.saturating_mul(channels);
        if start >= self.samples.len() {
            return Ok(());
        }
        for (dst, src) in self.samples[start..].iter_mut().zip(&other.samples) {
            *dst += *src;
        }
        Ok(())
    }

    /// Multiply every sample by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }

    /// Clamp every sample to `[-1.0, 1.0]`.
    pub fn hard_clip(&mut self) {
        for sample in &mut self.samples {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Little-endian `f32le` bytes, as fed to encoders.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Parse little-endian `f32le` bytes.
    pub fn from_le_bytes(target: AudioTarget, bytes: &[u8]) -> ReelcutResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(ReelcutError::decode(format!(
                "PCM stream of {} bytes is not a whole number of f32 samples",
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::from_interleaved(target, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_length() {
        let buffer = AudioBuffer::silent(AudioTarget::new(48000, 2), 5.0);
        assert_eq!(buffer.frames(), 240_000);
        assert_eq!(buffer.samples.len(), 480_000);
        assert!(buffer.is_silent());
        assert!((buffer.duration_secs() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_at_sums_and_truncates() {
        let target = AudioTarget::new(4, 1);
        let mut mix = AudioBuffer::silent_frames(target, 4);
        let clip = AudioBuffer::from_interleaved(target, vec![0.5, 0.5, 0.5]).unwrap();
        mix.add_at(&clip, 2).unwrap();
        mix.add_at(&clip, 3).unwrap();
        assert_eq!(mix.samples, vec![0.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_add_at_offset_past_end_is_noop() {
        let target = AudioTarget::new(4, 2);
        let mut mix = AudioBuffer::silent_frames(target, 2);
        let clip = AudioBuffer::from_interleaved(target, vec![1.0, 1.0]).unwrap();
        mix.add_at(&clip, 10).unwrap();
        assert!(mix.is_silent());
    }

    #[test]
    fn test_add_at_rejects_format_mismatch() {
        let mut mix = AudioBuffer::silent_frames(AudioTarget::new(48000, 2), 4);
        let clip = AudioBuffer::silent_frames(AudioTarget::new(44100, 2), 4);
        assert!(matches!(
            mix.add_at(&clip, 0),
            Err(ReelcutError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_rejects_partial_frames() {
        let result = AudioBuffer::from_interleaved(AudioTarget::new(48000, 2), vec![0.0; 3]);
        assert!(result.is_err());
    }

    #[test]
    fn test_le_bytes_parse() {
        let target = AudioTarget::new(8000, 1);
        let buffer = AudioBuffer::from_interleaved(target, vec![0.25, -1.0]).unwrap();
        let parsed = AudioBuffer::from_le_bytes(target, &buffer.to_le_bytes()).unwrap();
        assert_eq!(parsed, buffer);
        assert!(AudioBuffer::from_le_bytes(target, &[0, 0, 0]).is_err());
    }

    #[test]
    fn test_peak_gain_and_clip() {
        let target = AudioTarget::new(8000, 1);
        let mut buffer = AudioBuffer::from_interleaved(target, vec![0.5, -2.0, 1.5]).unwrap();
        assert_eq!(buffer.peak(), 2.0);
        let mut clipped = buffer.clone();
        clipped.hard_clip();
        assert_eq!(clipped.samples, vec![0.5, -1.0, 1.0]);
        buffer.apply_gain(0.5);
        assert_eq!(buffer.samples, vec![0.25, -1.0, 0.75]);
    }
}
