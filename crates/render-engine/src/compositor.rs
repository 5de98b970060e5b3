//! Frame compositor: paints a resolved frame onto a surface.
//!
//! The base clip is stretched to the full surface, then overlays are drawn in
//! resolved order. Each overlay sets the surface opacity for its own draw and
//! restores it to 1.0 afterwards, so no draw leaks opacity into the next.

use reelcut_project_model::overlay::OverlayKind;

use crate::decode_cache::DecodeSource;
use crate::resolver::ResolvedFrame;
use crate::surface::Surface;

/// What happened while painting one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// A base picture was drawn.
    pub base_drawn: bool,

    /// A base clip was resolved but its frame could not be decoded.
    pub base_skipped: bool,

    pub overlays_drawn: usize,

    /// Overlays skipped because their image could not be loaded or the
    /// surface has no font for their text.
    pub overlays_skipped: usize,
}

/// Paint `frame` onto `surface`, pulling media from `source`.
///
/// The surface is cleared first. Decode and image load failures are logged
/// and skipped; painting itself never fails.
pub async fn paint<S, D>(surface: &mut S, source: &mut D, frame: &ResolvedFrame<'_>) -> PaintReport
where
    S: Surface + Send + ?Sized,
    D: DecodeSource + ?Sized,
{
    let mut report = PaintReport::default();
    surface.clear();
    surface.set_opacity(1.0);

    if let Some(base) = &frame.base {
        let (width, height) = (surface.width(), surface.height());
        match source
            .frame_at(base.clip, base.source_time, width, height)
            .await
        {
            Ok(image) => {
                surface.draw_image_fill(&image);
                report.base_drawn = true;
            }
            Err(e) => {
                tracing::warn!(
                    clip = %base.clip.id,
                    source_time = base.source_time,
                    error = %e,
                    "Base frame decode failed, drawing overlays only"
                );
                report.base_skipped = true;
            }
        }
    }

    for instance in &frame.overlays {
        let overlay = instance.overlay;
        match &overlay.kind {
            OverlayKind::Text { text } => {
                surface.set_opacity(instance.opacity);
                let drawn = surface.draw_text(text, overlay.position);
                surface.set_opacity(1.0);
                if drawn {
                    report.overlays_drawn += 1;
                } else {
                    report.overlays_skipped += 1;
                }
            }
            OverlayKind::Image { image } => match source.overlay_image(image).await {
                Ok(pixels) => {
                    surface.set_opacity(instance.opacity);
                    surface.draw_image(&pixels, overlay.position);
                    surface.set_opacity(1.0);
                    report.overlays_drawn += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        clip = %instance.clip.id,
                        overlay = instance.overlay_index,
                        image = %image.path.display(),
                        error = %e,
                        "Overlay image failed to load, skipping"
                    );
                    surface.set_opacity(1.0);
                    report.overlays_skipped += 1;
                }
            },
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use image::{Rgba, RgbaImage};
    use reelcut_common::error::{ReelcutError, ReelcutResult};
    use reelcut_media_io::audio::{AudioBuffer, AudioTarget};
    use reelcut_project_model::clip::{Clip, SourceRef};
    use reelcut_project_model::overlay::{ImageRef, Overlay, Position};
    use reelcut_project_model::timeline::Timeline;

    use crate::resolver::resolve;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Fill,
        Image { opacity: f64 },
        Text { text: String, opacity: f64 },
    }

    struct RecordingSurface {
        opacity: f64,
        ops: Vec<Op>,
        has_font: bool,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self {
                opacity: 1.0,
                ops: Vec::new(),
                has_font: true,
            }
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> u32 {
            16
        }
        fn height(&self) -> u32 {
            9
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn opacity(&self) -> f64 {
            self.opacity
        }
        fn set_opacity(&mut self, opacity: f64) {
            self.opacity = opacity;
        }
        fn draw_image_fill(&mut self, _image: &RgbaImage) {
            self.ops.push(Op::Fill);
        }
        fn draw_image(&mut self, _image: &RgbaImage, _position: Position) {
            self.ops.push(Op::Image {
                opacity: self.opacity,
            });
        }
        fn draw_text(&mut self, text: &str, _position: Position) -> bool {
            if !self.has_font {
                return false;
            }
            self.ops.push(Op::Text {
                text: text.to_string(),
                opacity: self.opacity,
            });
            true
        }
    }

    struct StubSource {
        fail_frames: bool,
        missing_image: Option<ImageRef>,
        requests: Vec<(u32, u32)>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                fail_frames: false,
                missing_image: None,
                requests: Vec::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl DecodeSource for StubSource {
        async fn frame_at(
            &mut self,
            _clip: &Clip,
            _source_time: f64,
            width: u32,
            height: u32,
        ) -> ReelcutResult<RgbaImage> {
            self.requests.push((width, height));
            if self.fail_frames {
                return Err(ReelcutError::decode("no frame"));
            }
            Ok(RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255])))
        }

        async fn overlay_image(&mut self, image: &ImageRef) -> ReelcutResult<Arc<RgbaImage>> {
            if self.missing_image.as_ref() == Some(image) {
                return Err(ReelcutError::FileNotFound {
                    path: image.path.clone(),
                });
            }
            Ok(Arc::new(RgbaImage::new(2, 2)))
        }

        async fn clip_audio(
            &mut self,
            _clip: &Clip,
            _target: AudioTarget,
        ) -> ReelcutResult<Option<AudioBuffer>> {
            Ok(None)
        }
    }

    fn timeline() -> Timeline {
        let clip = Clip::new(SourceRef::new("a.mp4", 10.0), 0.0, 10.0, 0.0, 0, false)
            .unwrap()
            .with_overlay(
                Overlay::text("faded", Position::new(4.0, 20.0), 0.0, 5.0).with_opacity(0.25),
            )
            .unwrap()
            .with_overlay(Overlay::image(
                ImageRef::new("logo.png"),
                Position::new(1.0, 1.0),
                0.0,
                5.0,
            ))
            .unwrap()
            .with_overlay(Overlay::text("solid", Position::new(4.0, 40.0), 0.0, 5.0))
            .unwrap();
        let mut tl = Timeline::new();
        tl.add_clip(clip).unwrap();
        tl
    }

    #[tokio::test]
    async fn test_paints_base_then_overlays_in_order() {
        let tl = timeline();
        let frame = resolve(&tl, 1.0).unwrap();
        let mut surface = RecordingSurface::new();
        let mut source = StubSource::new();

        let report = paint(&mut surface, &mut source, &frame).await;

        assert_eq!(
            surface.ops,
            vec![
                Op::Clear,
                Op::Fill,
                Op::Text {
                    text: "faded".into(),
                    opacity: 0.25
                },
                Op::Image { opacity: 1.0 },
                Op::Text {
                    text: "solid".into(),
                    opacity: 1.0
                },
            ]
        );
        assert_eq!(source.requests, vec![(16, 9)]);
        assert!(report.base_drawn);
        assert_eq!(report.overlays_drawn, 3);
        assert_eq!(surface.opacity(), 1.0);
    }

    #[tokio::test]
    async fn test_failed_image_does_not_leak_opacity() {
        let mut tl = timeline();
        let id = tl.clips()[0].id.clone();
        tl.add_overlay(
            &id,
            Overlay::image(ImageRef::new("missing.png"), Position::default(), 0.0, 5.0)
                .with_opacity(0.1),
        )
        .unwrap();
        tl.add_overlay(&id, Overlay::text("after", Position::default(), 0.0, 5.0))
            .unwrap();

        let frame = resolve(&tl, 1.0).unwrap();
        let mut surface = RecordingSurface::new();
        let mut source = StubSource::new();
        source.missing_image = Some(ImageRef::new("missing.png"));

        let report = paint(&mut surface, &mut source, &frame).await;

        assert_eq!(report.overlays_skipped, 1);
        assert_eq!(report.overlays_drawn, 4);
        assert_eq!(
            surface.ops.last(),
            Some(&Op::Text {
                text: "after".into(),
                opacity: 1.0
            })
        );
    }

    #[tokio::test]
    async fn test_base_decode_failure_still_draws_overlays() {
        let tl = timeline();
        let frame = resolve(&tl, 1.0).unwrap();
        let mut surface = RecordingSurface::new();
        let mut source = StubSource::new();
        source.fail_frames = true;

        let report = paint(&mut surface, &mut source, &frame).await;

        assert!(!report.base_drawn);
        assert!(report.base_skipped);
        assert_eq!(report.overlays_drawn, 3);
        assert!(!surface.ops.contains(&Op::Fill));
    }

    #[tokio::test]
    async fn test_text_without_font_counts_as_skipped() {
        let tl = timeline();
        let frame = resolve(&tl, 1.0).unwrap();
        let mut surface = RecordingSurface::new();
        surface.has_font = false;
        let mut source = StubSource::new();

        let report = paint(&mut surface, &mut source, &frame).await;

        assert_eq!(report.overlays_drawn, 1);
        assert_eq!(report.overlays_skipped, 2);
        assert_eq!(surface.opacity(), 1.0);
        assert_eq!(surface.ops, vec![Op::Clear, Op::Fill, Op::Image { opacity: 1.0 }]);
    }

    #[tokio::test]
    async fn test_empty_frame_only_clears() {
        let tl = timeline();
        let frame = resolve(&tl, 42.0).unwrap();
        let mut surface = RecordingSurface::new();
        let mut source = StubSource::new();

        let report = paint(&mut surface, &mut source, &frame).await;

        assert_eq!(surface.ops, vec![Op::Clear]);
        assert_eq!(report, PaintReport::default());
        assert!(source.requests.is_empty());
    }

    #[tokio::test]
    async fn test_canvas_fill_uses_decoded_pixels() {
        let tl = timeline();
        let mut frame = resolve(&tl, 1.0).unwrap();
        frame.overlays.clear();
        let mut canvas = crate::surface::Canvas::new(4, 4);
        let mut source = StubSource::new();

        paint(&mut canvas, &mut source, &frame).await;

        assert!(canvas.image().pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }
}
