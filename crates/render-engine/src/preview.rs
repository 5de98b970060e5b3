//! Preview driver: interactive scrubbing and playback.
//!
//! The driver owns one canvas and a decode cache, and paints resolved frames
//! exactly as export does. Only the sink differs: frames are handed back to
//! the caller instead of an encoder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reelcut_common::clock::FrameClock;
use reelcut_common::error::ReelcutResult;
use reelcut_media_io::provider::MediaProvider;
use reelcut_project_model::timeline::Timeline;

use crate::compositor::{paint, PaintReport};
use crate::decode_cache::DecodeCache;
use crate::resolver::resolve;
use crate::surface::{Canvas, SharedFont};

/// Renders timeline frames on demand for an editing UI.
pub struct PreviewDriver<'p> {
    cache: DecodeCache<'p>,
    canvas: Canvas,
    clock: FrameClock,
    last_report: PaintReport,
}

impl<'p> PreviewDriver<'p> {
    pub fn new(provider: &'p dyn MediaProvider, width: u32, height: u32, fps: u32) -> Self {
        Self {
            cache: DecodeCache::new(provider),
            canvas: Canvas::new(width, height),
            clock: FrameClock::new(fps),
            last_report: PaintReport::default(),
        }
    }

    pub fn with_font(mut self, font: Option<SharedFont>) -> Self {
        self.canvas = self.canvas.with_font(font);
        self
    }

    /// Diagnostics from the most recent paint.
    pub fn last_report(&self) -> PaintReport {
        self.last_report
    }

    /// Paint the frame at timeline time `t` and return the canvas.
    pub async fn frame_at(&mut self, timeline: &Timeline, t: f64) -> ReelcutResult<&Canvas> {
        let frame = resolve(timeline, t)?;
        self.last_report = paint(&mut self.canvas, &mut self.cache, &frame).await;
        Ok(&self.canvas)
    }

    /// Play from `from_secs` in real time until the timeline ends or `stop`
    /// is set, calling `on_frame` with each painted frame.
    ///
    /// Frames that cannot be painted in time are skipped rather than queued.
    /// Returns the timeline time at which playback stopped.
    pub async fn play<F>(
        &mut self,
        timeline: &Timeline,
        from_secs: f64,
        stop: &AtomicBool,
        mut on_frame: F,
    ) -> ReelcutResult<f64>
    where
        F: FnMut(f64, &Canvas),
    {
        let duration = timeline.duration_secs();
        let from = from_secs.max(0.0);
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(self.clock.frame_duration()));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::debug!(
            from_secs = from,
            duration_secs = duration,
            fps = self.clock.fps(),
            "Starting playback"
        );
        let started = tokio::time::Instant::now();
        let mut position = from;
        loop {
            interval.tick().await;
            if stop.load(Ordering::SeqCst) {
                break;
            }
            position = from + started.elapsed().as_secs_f64();
            if position >= duration {
                position = duration;
                break;
            }
            let canvas = self.frame_at(timeline, position).await?;
            on_frame(position, canvas);
        }
        tracing::debug!(position_secs = position, "Playback stopped");
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use image::{Rgba, RgbaImage};
    use reelcut_common::error::ReelcutError;
    use reelcut_media_io::audio::{AudioBuffer, AudioTarget};
    use reelcut_media_io::provider::{
        AudioTrack, Encoder, EncoderSpec, OpenedMedia, VideoTrack,
    };
    use reelcut_project_model::clip::{Clip, SourceRef};
    use reelcut_project_model::export::FormatSelection;
    use reelcut_project_model::overlay::ImageRef;

    /// Decodes every source to a solid colour derived from the source time.
    struct SolidProvider {
        decodes: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MediaProvider for SolidProvider {
        fn name(&self) -> &str {
            "solid"
        }

        async fn open(&self, source: &SourceRef) -> ReelcutResult<OpenedMedia> {
            Ok(OpenedMedia {
                video: Some(VideoTrack {
                    source: source.clone(),
                    width: 8,
                    height: 8,
                }),
                audio: None,
            })
        }

        async fn decode_image_at(
            &self,
            _track: &VideoTrack,
            source_time: f64,
            width: u32,
            height: u32,
        ) -> ReelcutResult<RgbaImage> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            let shade = (source_time * 10.0) as u8;
            Ok(RgbaImage::from_pixel(width, height, Rgba([shade, 0, 0, 255])))
        }

        async fn decode_audio_range(
            &self,
            _track: &AudioTrack,
            _start_secs: f64,
            _end_secs: f64,
            _target: AudioTarget,
        ) -> ReelcutResult<AudioBuffer> {
            Err(ReelcutError::decode("no audio"))
        }

        async fn load_image(&self, image: &ImageRef) -> ReelcutResult<RgbaImage> {
            Err(ReelcutError::FileNotFound {
                path: image.path.clone(),
            })
        }

        async fn probe_encodable(&self, _candidates: &[FormatSelection]) -> Option<FormatSelection> {
            None
        }

        async fn create_encoder(
            &self,
            _selection: FormatSelection,
            _spec: EncoderSpec,
        ) -> ReelcutResult<Box<dyn Encoder>> {
            Err(ReelcutError::unsupported("preview only"))
        }
    }

    fn timeline() -> Timeline {
        let mut tl = Timeline::new();
        tl.add_clip(Clip::new(SourceRef::new("a.mp4", 10.0), 2.0, 4.0, 0.0, 0, false).unwrap())
            .unwrap();
        tl
    }

    #[tokio::test]
    async fn test_frame_at_paints_trimmed_source_time() {
        let provider = SolidProvider {
            decodes: AtomicUsize::new(0),
        };
        let tl = timeline();
        let mut driver = PreviewDriver::new(&provider, 4, 4, 30);

        let canvas = driver.frame_at(&tl, 1.0).await.unwrap();
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgba([30, 0, 0, 255]));
        assert!(driver.last_report().base_drawn);
    }

    #[tokio::test]
    async fn test_frame_at_outside_clips_is_transparent() {
        let provider = SolidProvider {
            decodes: AtomicUsize::new(0),
        };
        let tl = timeline();
        let mut driver = PreviewDriver::new(&provider, 4, 4, 30);

        driver.frame_at(&tl, 1.0).await.unwrap();
        let canvas = driver.frame_at(&tl, 5.0).await.unwrap();
        assert!(canvas.image().pixels().all(|p| p[3] == 0));
    }

    #[tokio::test]
    async fn test_repeated_scrub_reuses_decoded_frame() {
        let provider = SolidProvider {
            decodes: AtomicUsize::new(0),
        };
        let tl = timeline();
        let mut driver = PreviewDriver::new(&provider, 4, 4, 30);

        driver.frame_at(&tl, 0.5).await.unwrap();
        driver.frame_at(&tl, 0.5).await.unwrap();
        assert_eq!(provider.decodes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_runs_to_end() {
        let provider = SolidProvider {
            decodes: AtomicUsize::new(0),
        };
        let tl = timeline();
        let mut driver = PreviewDriver::new(&provider, 2, 2, 10);
        let stop = AtomicBool::new(false);
        let mut times = Vec::new();

        let end = driver
            .play(&tl, 1.0, &stop, |t, _| times.push(t))
            .await
            .unwrap();

        assert_eq!(end, 2.0);
        assert!(!times.is_empty());
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert!(times.iter().all(|t| (1.0..2.0).contains(t)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_honours_stop_flag() {
        let provider = SolidProvider {
            decodes: AtomicUsize::new(0),
        };
        let tl = timeline();
        let mut driver = PreviewDriver::new(&provider, 2, 2, 10);
        let stop = Arc::new(AtomicBool::new(false));
        let mut frames = 0;

        let flag = Arc::clone(&stop);
        driver
            .play(&tl, 0.0, &stop, move |_, _| {
                frames += 1;
                if frames == 3 {
                    flag.store(true, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        assert!(provider.decodes.load(Ordering::SeqCst) <= 3);
    }
}
