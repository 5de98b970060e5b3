//! Export pipeline: renders a timeline into an encoded artifact.
//!
//! Stages run strictly in order:
//!
//! 1. **Configuring:** pick the first encodable format, create the encoder,
//!    mix the complete audio track.
//! 2. **Encoding:** for `t = i / fps` while `t < duration`, resolve, paint,
//!    and submit one frame, awaiting acceptance before the next.
//! 3. **Finalizing:** close the container and collect the bytes.
//!
//! Any failure, including cancellation, drops the encoder and discards
//! everything written so far.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use reelcut_common::clock::FrameClock;
use reelcut_common::config::HeadroomPolicy;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_io::audio::AudioTarget;
use reelcut_media_io::provider::{EncodedArtifact, EncoderSpec, MediaProvider};
use reelcut_project_model::clip::Clip;
use reelcut_project_model::export::{ExportSettings, FormatSelection};
use reelcut_project_model::timeline::{Timeline, TimelineError};

use crate::audio_mix::mix;
use crate::compositor::paint;
use crate::decode_cache::DecodeCache;
use crate::resolver::resolve;
use crate::surface::{Canvas, SharedFont};

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames submitted and accepted so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Configuring,
    Encoding,
    Finalizing,
    Done,
    Failed,
}

/// Everything an export needs besides the timeline and provider.
pub struct ExportOptions {
    pub settings: ExportSettings,

    pub headroom: HeadroomPolicy,

    /// Font for text overlays. Text is skipped when absent.
    pub font: Option<SharedFont>,

    /// Set to `true` to stop the export at the next frame boundary.
    pub cancel: Option<Arc<AtomicBool>>,

    pub progress: Option<ProgressCallback>,
}

impl ExportOptions {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            headroom: HeadroomPolicy::default(),
            font: None,
            cancel: None,
            progress: None,
        }
    }

    pub fn with_headroom(mut self, headroom: HeadroomPolicy) -> Self {
        self.headroom = headroom;
        self
    }

    pub fn with_font(mut self, font: Option<SharedFont>) -> Self {
        self.font = font;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl std::fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOptions")
            .field("settings", &self.settings)
            .field("headroom", &self.headroom)
            .field("has_font", &self.font.is_some())
            .field("cancellable", &self.cancel.is_some())
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

/// Render `timeline` through `provider` and return the encoded bytes.
///
/// The timeline is borrowed for the whole export and must not change while
/// it runs. Errors are returned intact; an encoder rejection surfaces as
/// [`ReelcutError::EncodeSubmission`] carrying the frame timestamp.
pub async fn export_timeline(
    timeline: &Timeline,
    provider: &dyn MediaProvider,
    options: ExportOptions,
) -> ReelcutResult<EncodedArtifact> {
    let settings = options.settings;
    tracing::info!(
        clips = timeline.len(),
        width = settings.width,
        height = settings.height,
        fps = settings.fps,
        provider = provider.name(),
        "Starting export"
    );

    let mut reporter = Reporter::new(options.progress.as_ref());
    let result = run_export(timeline, provider, &options, &mut reporter).await;

    match &result {
        Ok(artifact) => {
            reporter.report(ExportStage::Done, reporter.total_frames);
            tracing::info!(
                bytes = artifact.bytes.len(),
                mime_type = %artifact.mime_type,
                elapsed_secs = reporter.started.elapsed().as_secs_f64(),
                "Export complete"
            );
        }
        Err(ReelcutError::Cancelled) => {
            reporter.report(ExportStage::Failed, reporter.frames_rendered);
            tracing::info!(
                frames_rendered = reporter.frames_rendered,
                "Export cancelled"
            );
        }
        Err(e) => {
            reporter.report(ExportStage::Failed, reporter.frames_rendered);
            tracing::error!(error = %e, "Export failed");
        }
    }
    result
}

/// Export a single clip's trimmed range as its own artifact.
///
/// The clip is placed at time zero on the base track. Its overlays move with
/// it, so they stay over the same source content; overlays that ended before
/// the clip started are dropped.
pub async fn export_trimmed(
    clip: &Clip,
    provider: &dyn MediaProvider,
    options: ExportOptions,
) -> ReelcutResult<EncodedArtifact> {
    let timeline = trimmed_timeline(clip)?;
    export_timeline(&timeline, provider, options).await
}

fn trimmed_timeline(clip: &Clip) -> ReelcutResult<Timeline> {
    let offset = clip.start_secs;
    let mut trimmed = clip.clone();
    trimmed.start_secs = 0.0;
    trimmed.track = 0;
    trimmed.overlays = clip
        .overlays
        .iter()
        .filter(|o| o.end_secs - offset > 0.0)
        .map(|o| {
            let mut shifted = o.clone();
            shifted.start_secs = (o.start_secs - offset).max(0.0);
            shifted.end_secs = o.end_secs - offset;
            shifted
        })
        .collect();

    let mut timeline = Timeline::with_base_track(0);
    timeline.add_clip(trimmed).map_err(timeline_invariant)?;
    Ok(timeline)
}

async fn run_export(
    timeline: &Timeline,
    provider: &dyn MediaProvider,
    options: &ExportOptions,
    reporter: &mut Reporter<'_>,
) -> ReelcutResult<EncodedArtifact> {
    let settings = options.settings;
    if settings.width == 0 || settings.height == 0 {
        return Err(ReelcutError::config(format!(
            "Export resolution must be non-zero, got {}x{}",
            settings.width, settings.height
        )));
    }
    if settings.sample_rate == 0 || settings.channels == 0 {
        return Err(ReelcutError::config(
            "Export audio needs a non-zero sample rate and channel count",
        ));
    }
    timeline.validate().map_err(timeline_invariant)?;

    let duration = timeline.duration_secs();
    if duration <= 0.0 {
        return Err(ReelcutError::render(
            "Export duration resolved to zero seconds",
        ));
    }

    let clock = FrameClock::new(settings.fps);
    reporter.total_frames = clock.frame_count(duration);
    reporter.report(ExportStage::Configuring, 0);

    let selection = provider
        .probe_encodable(&FormatSelection::PREFERENCE)
        .await
        .ok_or_else(|| {
            ReelcutError::unsupported_format(format!(
                "{} cannot encode any of MP4 (H.264/AAC), WebM (VP9/Opus), WebM (VP8/Opus)",
                provider.name()
            ))
        })?;
    tracing::info!(
        format = %selection,
        mime_type = selection.mime_type(),
        duration_secs = duration,
        total_frames = reporter.total_frames,
        "Selected export format"
    );

    let target = AudioTarget::new(settings.sample_rate, settings.channels);
    let mut encoder = provider
        .create_encoder(
            selection,
            EncoderSpec {
                width: settings.width,
                height: settings.height,
                fps: clock.fps(),
                audio: target,
            },
        )
        .await?;

    let mut cache = DecodeCache::new(provider);
    check_cancelled(options.cancel.as_deref())?;

    let audio = mix(timeline, &mut cache, target, options.headroom).await?;
    encoder
        .add_audio_track(&audio)
        .await
        .map_err(|e| submission_error(e, 0.0))?;
    encoder.start().await?;

    let mut canvas = Canvas::new(settings.width, settings.height).with_font(options.font.clone());
    let frame_duration = clock.frame_duration();

    for (index, t) in clock.frames(duration) {
        check_cancelled(options.cancel.as_deref())?;

        let frame = resolve(timeline, t)?;
        let painted = paint(&mut canvas, &mut cache, &frame).await;
        tracing::trace!(
            frame = index,
            t,
            base_drawn = painted.base_drawn,
            overlays = painted.overlays_drawn,
            "Painted frame"
        );

        encoder
            .add_video_frame(canvas.image(), t, frame_duration)
            .await
            .map_err(|e| submission_error(e, t))?;
        reporter.report(ExportStage::Encoding, index + 1);
    }

    reporter.report(ExportStage::Finalizing, reporter.total_frames);
    let artifact = encoder.finalize().await?;
    Ok(artifact)
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> ReelcutResult<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::SeqCst) => Err(ReelcutError::Cancelled),
        _ => Ok(()),
    }
}

/// Attach the submission timestamp to encoder errors that lack one.
fn submission_error(error: ReelcutError, timestamp_secs: f64) -> ReelcutError {
    match error {
        e @ (ReelcutError::EncodeSubmission { .. } | ReelcutError::Cancelled) => e,
        other => ReelcutError::encode_submission(timestamp_secs, other.to_string()),
    }
}

fn timeline_invariant(error: TimelineError) -> ReelcutError {
    ReelcutError::invariant(error.to_string())
}

struct Reporter<'a> {
    callback: Option<&'a ProgressCallback>,
    started: Instant,
    total_frames: u64,
    frames_rendered: u64,
}

impl<'a> Reporter<'a> {
    fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            started: Instant::now(),
            total_frames: 0,
            frames_rendered: 0,
        }
    }

    fn report(&mut self, stage: ExportStage, frames_rendered: u64) {
        self.frames_rendered = frames_rendered;
        if let Some(cb) = self.callback {
            cb(progress_report(
                stage,
                frames_rendered,
                self.total_frames,
                self.started.elapsed().as_secs_f64(),
            ));
        }
    }
}

fn progress_report(
    stage: ExportStage,
    frames_rendered: u64,
    total_frames: u64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = match stage {
        ExportStage::Done => 1.0,
        _ if total_frames == 0 => 0.0,
        _ => (frames_rendered as f64 / total_frames as f64).clamp(0.0, 1.0),
    };
    let eta_secs = if progress > 0.0 && stage == ExportStage::Encoding {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress,
        frames_rendered,
        total_frames,
        eta_secs,
        stage,
    }
}
