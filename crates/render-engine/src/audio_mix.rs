//! Audio mixer: sums every audio-bearing clip into one buffer.
//!
//! The mix spans `[0, timeline duration)` in a fixed target format. Each
//! clip's trimmed audio is placed at its timeline start. Clips whose source
//! cannot be opened or decoded contribute silence.

use reelcut_common::clock::secs_to_samples;
use reelcut_common::config::HeadroomPolicy;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_io::audio::{AudioBuffer, AudioTarget};
use reelcut_project_model::timeline::Timeline;

use crate::decode_cache::DecodeSource;

/// Mix all `has_audio` clips of `timeline` into a single buffer.
pub async fn mix<D>(
    timeline: &Timeline,
    source: &mut D,
    target: AudioTarget,
    headroom: HeadroomPolicy,
) -> ReelcutResult<AudioBuffer>
where
    D: DecodeSource + ?Sized,
{
    let duration = timeline.duration_secs();
    let mut mixed = AudioBuffer::silent_frames(target, secs_to_samples(duration, target.sample_rate));

    let mut contributing = 0usize;
    for clip in timeline.audio_clips() {
        let buffer = match source.clip_audio(clip, target).await {
            Ok(Some(buffer)) => buffer,
            Ok(None) => {
                tracing::debug!(clip = %clip.id, "Clip source has no audio track");
                continue;
            }
            // Missing or unreadable sources are as good as silent.
            Err(e) if e.is_recoverable_source_error() => {
                tracing::warn!(
                    clip = %clip.id,
                    source = %clip.source.path.display(),
                    error = %e,
                    "Clip audio unavailable, mixing silence"
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        if buffer.target() != target {
            return Err(ReelcutError::invariant(format!(
                "provider returned {}Hz/{}ch audio for a {}Hz/{}ch mix",
                buffer.sample_rate, buffer.channels, target.sample_rate, target.channels
            )));
        }
        mixed.add_at(&buffer, secs_to_samples(clip.start_secs, target.sample_rate))?;
        contributing += 1;
    }

    let peak = mixed.peak();
    apply_headroom(&mut mixed, headroom);
    tracing::debug!(
        clips = contributing,
        frames = mixed.frames(),
        peak,
        headroom = ?headroom,
        "Audio mix complete"
    );
    Ok(mixed)
}

/// Keep the summed signal within `[-1.0, 1.0]` according to `policy`.
pub fn apply_headroom(buffer: &mut AudioBuffer, policy: HeadroomPolicy) {
    match policy {
        HeadroomPolicy::None => {}
        HeadroomPolicy::HardClip => buffer.hard_clip(),
        HeadroomPolicy::PeakNormalize => {
            let peak = buffer.peak();
            if peak > 1.0 {
                buffer.apply_gain(1.0 / peak);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use image::RgbaImage;
    use reelcut_project_model::clip::{Clip, SourceRef};
    use reelcut_project_model::overlay::ImageRef;

    /// Serves constant-valued audio per source path.
    struct ToneSource {
        levels: HashMap<&'static str, f32>,
        failing: Option<(&'static str, fn() -> ReelcutError)>,
    }

    #[async_trait::async_trait]
    impl DecodeSource for ToneSource {
        async fn frame_at(
            &mut self,
            _clip: &Clip,
            _source_time: f64,
            _width: u32,
            _height: u32,
        ) -> ReelcutResult<RgbaImage> {
            Err(ReelcutError::decode("audio only"))
        }

        async fn overlay_image(&mut self, _image: &ImageRef) -> ReelcutResult<Arc<RgbaImage>> {
            Err(ReelcutError::decode("audio only"))
        }

        async fn clip_audio(
            &mut self,
            clip: &Clip,
            target: AudioTarget,
        ) -> ReelcutResult<Option<AudioBuffer>> {
            let path = clip.source.path.to_string_lossy();
            if let Some((failing_path, error)) = self.failing {
                if failing_path == path {
                    return Err(error());
                }
            }
            let Some(level) = self.levels.get(path.as_ref()) else {
                return Ok(None);
            };
            let frames = secs_to_samples(clip.duration_secs(), target.sample_rate);
            let samples = vec![*level; frames * target.channels as usize];
            AudioBuffer::from_interleaved(target, samples).map(Some)
        }
    }

    fn target() -> AudioTarget {
        AudioTarget::new(100, 1)
    }

    fn clip(path: &str, start: f64, len: f64, has_audio: bool) -> Clip {
        Clip::new(SourceRef::new(path, 60.0), 0.0, len, start, 0, has_audio).unwrap()
    }

    fn tones(levels: &[(&'static str, f32)]) -> ToneSource {
        ToneSource {
            levels: levels.iter().copied().collect(),
            failing: None,
        }
    }

    #[tokio::test]
    async fn test_no_audio_clips_gives_silence_of_full_length() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.mp4", 0.0, 2.0, false)).unwrap();
        tl.add_clip(clip("b.mp4", 1.0, 2.5, false)).unwrap();

        let mixed = mix(&tl, &mut tones(&[]), AudioTarget::default(), HeadroomPolicy::default())
            .await
            .unwrap();

        assert_eq!(mixed.frames(), (3.5 * 48000.0) as usize);
        assert!(mixed.is_silent());
    }

    #[tokio::test]
    async fn test_clips_are_placed_at_their_start() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.wav", 1.0, 1.0, true)).unwrap();

        let mixed = mix(&tl, &mut tones(&[("a.wav", 0.5)]), target(), HeadroomPolicy::None)
            .await
            .unwrap();

        assert_eq!(mixed.frames(), 200);
        assert!(mixed.samples[..100].iter().all(|s| *s == 0.0));
        assert!(mixed.samples[100..].iter().all(|s| *s == 0.5));
    }

    #[tokio::test]
    async fn test_overlapping_clips_sum() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.wav", 0.0, 2.0, true)).unwrap();
        tl.add_clip(clip("b.wav", 1.0, 1.0, true)).unwrap();

        let mixed = mix(
            &tl,
            &mut tones(&[("a.wav", 0.25), ("b.wav", 0.5)]),
            target(),
            HeadroomPolicy::None,
        )
        .await
        .unwrap();

        assert_eq!(mixed.samples[50], 0.25);
        assert_eq!(mixed.samples[150], 0.75);
    }

    #[tokio::test]
    async fn test_peak_normalize_scales_only_when_clipping() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.wav", 0.0, 1.0, true)).unwrap();
        tl.add_clip(clip("b.wav", 0.0, 1.0, true)).unwrap();

        let mixed = mix(
            &tl,
            &mut tones(&[("a.wav", 0.8), ("b.wav", 0.8)]),
            target(),
            HeadroomPolicy::PeakNormalize,
        )
        .await
        .unwrap();
        assert!((mixed.peak() - 1.0).abs() < 1e-6);

        let quiet = mix(
            &tl,
            &mut tones(&[("a.wav", 0.2), ("b.wav", 0.2)]),
            target(),
            HeadroomPolicy::PeakNormalize,
        )
        .await
        .unwrap();
        assert!((quiet.peak() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_hard_clip_policy() {
        let mut buffer = AudioBuffer::from_interleaved(target(), vec![1.5, -2.0, 0.3]).unwrap();
        apply_headroom(&mut buffer, HeadroomPolicy::HardClip);
        assert_eq!(buffer.samples, vec![1.0, -1.0, 0.3]);
    }

    #[tokio::test]
    async fn test_decode_failure_contributes_silence() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.wav", 0.0, 1.0, true)).unwrap();
        tl.add_clip(clip("bad.wav", 0.0, 1.0, true)).unwrap();
        let mut source = tones(&[("a.wav", 0.5), ("bad.wav", 0.5)]);
        source.failing = Some(("bad.wav", || ReelcutError::decode("corrupt stream")));

        let mixed = mix(&tl, &mut source, target(), HeadroomPolicy::None)
            .await
            .unwrap();

        assert!(mixed.samples.iter().all(|s| *s == 0.5));
    }

    #[tokio::test]
    async fn test_missing_source_contributes_silence() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.wav", 0.0, 1.0, true)).unwrap();
        tl.add_clip(clip("/nonexistent/gone.wav", 0.5, 1.0, true)).unwrap();
        let mut source = tones(&[("a.wav", 0.5)]);
        source.failing = Some(("/nonexistent/gone.wav", || ReelcutError::FileNotFound {
            path: "/nonexistent/gone.wav".into(),
        }));

        let mixed = mix(&tl, &mut source, target(), HeadroomPolicy::None)
            .await
            .unwrap();

        assert_eq!(mixed.frames(), 150);
        assert!(mixed.samples[..100].iter().all(|s| *s == 0.5));
        assert!(mixed.samples[100..].iter().all(|s| *s == 0.0));
    }

    #[tokio::test]
    async fn test_invariant_error_from_source_propagates() {
        let mut tl = Timeline::new();
        tl.add_clip(clip("a.wav", 0.0, 1.0, true)).unwrap();
        let mut source = tones(&[]);
        source.failing = Some(("a.wav", || ReelcutError::invariant("bad trim")));

        let err = mix(&tl, &mut source, target(), HeadroomPolicy::None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReelcutError::InvariantViolation { .. }));
    }

    #[tokio::test]
    async fn test_empty_timeline_mixes_nothing() {
        let mixed = mix(&Timeline::new(), &mut tones(&[]), target(), HeadroomPolicy::None)
            .await
            .unwrap();
        assert_eq!(mixed.frames(), 0);
    }
}
