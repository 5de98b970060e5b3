//! Decoded media access for the render loop.
//!
//! [`DecodeSource`] is what the compositor and mixer pull pixels and samples
//! from. [`DecodeCache`] implements it over a [`MediaProvider`], opening each
//! source once and keeping overlay images for the lifetime of a render. A
//! source that fails to open is remembered and not retried.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_io::audio::{AudioBuffer, AudioTarget};
use reelcut_media_io::provider::{MediaProvider, OpenedMedia};
use reelcut_project_model::clip::{Clip, ClipId};
use reelcut_project_model::overlay::ImageRef;

/// Decoded frames, overlay images, and clip audio.
#[async_trait::async_trait]
pub trait DecodeSource: Send {
    /// Frame of `clip` at `source_time`, scaled to `width` x `height`.
    async fn frame_at(
        &mut self,
        clip: &Clip,
        source_time: f64,
        width: u32,
        height: u32,
    ) -> ReelcutResult<RgbaImage>;

    /// Still image for an overlay.
    async fn overlay_image(&mut self, image: &ImageRef) -> ReelcutResult<Arc<RgbaImage>>;

    /// The trimmed audio of `clip`, or `None` when the source has no audio track.
    async fn clip_audio(
        &mut self,
        clip: &Clip,
        target: AudioTarget,
    ) -> ReelcutResult<Option<AudioBuffer>>;
}

struct LastFrame {
    clip_id: ClipId,
    source_time: f64,
    width: u32,
    height: u32,
    image: RgbaImage,
}

/// Provider-backed [`DecodeSource`] with per-render caching.
pub struct DecodeCache<'p> {
    provider: &'p dyn MediaProvider,
    /// Open results per source path; failures keep their message.
    opened: HashMap<PathBuf, Result<OpenedMedia, String>>,
    images: HashMap<ImageRef, Arc<RgbaImage>>,
    last_frame: Option<LastFrame>,
}

impl<'p> DecodeCache<'p> {
    pub fn new(provider: &'p dyn MediaProvider) -> Self {
        Self {
            provider,
            opened: HashMap::new(),
            images: HashMap::new(),
            last_frame: None,
        }
    }

    async fn opened(&mut self, clip: &Clip) -> ReelcutResult<&OpenedMedia> {
        let path = &clip.source.path;
        if !self.opened.contains_key(path) {
            match self.provider.open(&clip.source).await {
                Ok(media) => {
                    tracing::debug!(
                        source = %path.display(),
                        has_video = media.video.is_some(),
                        has_audio = media.audio.is_some(),
                        "Opened source"
                    );
                    self.opened.insert(path.clone(), Ok(media));
                }
                Err(e) => {
                    tracing::debug!(source = %path.display(), error = %e, "Source failed to open");
                    self.opened.insert(path.clone(), Err(e.to_string()));
                    return Err(e);
                }
            }
        }
        match self.opened.get(path) {
            Some(Ok(media)) => Ok(media),
            Some(Err(message)) => Err(ReelcutError::decode(format!(
                "source {} unavailable: {message}",
                path.display()
            ))),
            None => Err(ReelcutError::decode(format!(
                "source {} not open",
                path.display()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl DecodeSource for DecodeCache<'_> {
    async fn frame_at(
        &mut self,
        clip: &Clip,
        source_time: f64,
        width: u32,
        height: u32,
    ) -> ReelcutResult<RgbaImage> {
        // Repeated requests (a paused preview) skip the decoder.
        if let Some(last) = &self.last_frame {
            if last.clip_id == clip.id
                && last.source_time == source_time
                && last.width == width
                && last.height == height
            {
                return Ok(last.image.clone());
            }
        }

        let provider = self.provider;
        let track = self
            .opened(clip)
            .await?
            .video
            .clone()
            .ok_or_else(|| {
                ReelcutError::decode(format!(
                    "source {} has no video track",
                    clip.source.path.display()
                ))
            })?;
        let image = provider
            .decode_image_at(&track, source_time, width, height)
            .await?;

        self.last_frame = Some(LastFrame {
            clip_id: clip.id.clone(),
            source_time,
            width,
            height,
            image: image.clone(),
        });
        Ok(image)
    }

    async fn overlay_image(&mut self, image: &ImageRef) -> ReelcutResult<Arc<RgbaImage>> {
        if let Some(cached) = self.images.get(image) {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new(self.provider.load_image(image).await?);
        self.images.insert(image.clone(), Arc::clone(&loaded));
        Ok(loaded)
    }

    async fn clip_audio(
        &mut self,
        clip: &Clip,
        target: AudioTarget,
    ) -> ReelcutResult<Option<AudioBuffer>> {
        let provider = self.provider;
        let Some(track) = self.opened(clip).await?.audio.clone() else {
            return Ok(None);
        };
        let buffer = provider
            .decode_audio_range(&track, clip.in_secs, clip.out_secs, target)
            .await?;
        Ok(Some(buffer))
    }
}
