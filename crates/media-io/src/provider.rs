//! The media provider contract consumed by the render engine.

use image::RgbaImage;

use reelcut_common::error::ReelcutResult;
use reelcut_project_model::clip::SourceRef;
use reelcut_project_model::export::FormatSelection;
use reelcut_project_model::overlay::ImageRef;

use crate::audio::{AudioBuffer, AudioTarget};

/// Handle to a source's primary video track.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoTrack {
    pub source: SourceRef,
    pub width: u32,
    pub height: u32,
}

/// Handle to a source's primary audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub source: SourceRef,
    pub sample_rate: u32,
    pub channels: u16,
}

/// The tracks found when opening a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenedMedia {
    pub video: Option<VideoTrack>,
    pub audio: Option<AudioTrack>,
}

/// Parameters an encoder is created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub audio: AudioTarget,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Trait for media backends (ffmpeg, platform codecs, test doubles).
#[async_trait::async_trait]
pub trait MediaProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Open a source and report its primary tracks.
    async fn open(&self, source: &SourceRef) -> ReelcutResult<OpenedMedia>;

    /// Decode the frame shown at `source_time`, scaled to `width` x `height`.
    ///
    /// Fails with [`ReelcutError::Decode`](reelcut_common::ReelcutError::Decode)
    /// when no frame exists at that instant.
    async fn decode_image_at(
        &self,
        track: &VideoTrack,
        source_time: f64,
        width: u32,
        height: u32,
    ) -> ReelcutResult<RgbaImage>;

    /// Decode `[start, end)` of an audio track, resampled to `target`.
    async fn decode_audio_range(
        &self,
        track: &AudioTrack,
        start_secs: f64,
        end_secs: f64,
        target: AudioTarget,
    ) -> ReelcutResult<AudioBuffer>;

    /// Load a still image used by an overlay.
    async fn load_image(&self, image: &ImageRef) -> ReelcutResult<RgbaImage>;

    /// First candidate, in order, whose container and codecs can be encoded.
    async fn probe_encodable(&self, candidates: &[FormatSelection]) -> Option<FormatSelection>;

    /// Create an encoder that accumulates output in memory.
    async fn create_encoder(
        &self,
        selection: FormatSelection,
        spec: EncoderSpec,
    ) -> ReelcutResult<Box<dyn Encoder>>;
}

/// A streaming audio/video encoder.
///
/// Call order: [`add_audio_track`](Encoder::add_audio_track) (optional),
/// [`start`](Encoder::start), any number of
/// [`add_video_frame`](Encoder::add_video_frame), then
/// [`finalize`](Encoder::finalize). Dropping an encoder before finalizing
/// discards everything written so far and releases its resources.
#[async_trait::async_trait]
pub trait Encoder: Send {
    /// Attach the fully mixed audio track. Must precede `start`.
    async fn add_audio_track(&mut self, buffer: &AudioBuffer) -> ReelcutResult<()>;

    /// Begin the output stream.
    async fn start(&mut self) -> ReelcutResult<()>;

    /// Submit one video frame. Resolves once the encoder has accepted it.
    ///
    /// Timestamps must increase strictly and without gaps.
    async fn add_video_frame(
        &mut self,
        frame: &RgbaImage,
        timestamp_secs: f64,
        duration_secs: f64,
    ) -> ReelcutResult<()>;

    /// Flush trailing state and return the complete artifact.
    async fn finalize(&mut self) -> ReelcutResult<EncodedArtifact>;
}
