//! Clock and timing utilities for fixed-rate timeline iteration.
//!
//! All Reelcut rendering walks the timeline clock in whole frame steps.
//! Timestamps are derived from the frame index (`i / fps`) rather than
//! accumulated, so long exports never drift away from the frame grid.

/// A fixed-rate frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock ticking at `fps` frames per second (minimum 1).
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    /// Frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Duration of one frame step in seconds.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Timeline time of frame `index` in seconds.
    pub fn timestamp(&self, index: u64) -> f64 {
        index as f64 / self.fps as f64
    }

    /// Number of frames whose timestamp lies strictly before `duration_secs`.
    pub fn frame_count(&self, duration_secs: f64) -> u64 {
        if !(duration_secs > 0.0) {
            return 0;
        }
        let mut count = (duration_secs * self.fps as f64).floor() as u64;
        while self.timestamp(count) < duration_secs {
            count += 1;
        }
        while count > 0 && self.timestamp(count - 1) >= duration_secs {
            count -= 1;
        }
        count
    }

    /// Iterate `(index, timestamp)` pairs covering `[0, duration_secs)`.
    pub fn frames(&self, duration_secs: f64) -> impl Iterator<Item = (u64, f64)> + '_ {
        (0..self.frame_count(duration_secs)).map(move |i| (i, self.timestamp(i)))
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Convert seconds to a whole number of sample frames at `sample_rate`.
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    if !(secs > 0.0) {
        return 0;
    }
    (secs * sample_rate as f64).round() as usize
}
