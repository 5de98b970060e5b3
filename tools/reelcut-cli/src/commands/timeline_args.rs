//! Building a timeline from command-line clip and overlay specs.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::Args;

use reelcut_media_io::FfmpegProvider;
use reelcut_project_model::clip::Clip;
use reelcut_project_model::overlay::{ImageRef, Overlay, Position};
use reelcut_project_model::timeline::Timeline;

/// Overlay position used when a spec gives none.
const DEFAULT_OVERLAY_POSITION: Position = Position { x: 24.0, y: 48.0 };

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Clip to place: PATH[@IN:OUT][+START][#TRACK]. Without +START the clip
    /// is appended after the current end of its track.
    #[arg(long = "clip", value_name = "SPEC", required = true)]
    pub clips: Vec<String>,

    /// Text overlay: TEXT@START-END[@X,Y[,OPACITY]]
    #[arg(long = "text", value_name = "SPEC")]
    pub texts: Vec<String>,

    /// Image overlay: PATH@START-END[@X,Y[,OPACITY]]
    #[arg(long = "image", value_name = "SPEC")]
    pub images: Vec<String>,

    /// Track whose clips form the base picture
    #[arg(long, default_value = "0")]
    pub base_track: u32,
}

/// A parsed `--clip` value.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpec {
    pub path: PathBuf,
    pub trim: Option<(f64, f64)>,
    pub start: Option<f64>,
    pub track: Option<u32>,
}

/// A parsed `--text` or `--image` value.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub body: String,
    pub start: f64,
    pub end: f64,
    pub position: Position,
    pub opacity: Option<f64>,
}

impl TimelineArgs {
    /// Probe every clip source and assemble the timeline.
    ///
    /// Overlays attach to the first clip; their windows are absolute
    /// timeline times regardless of the owning clip.
    pub async fn build(&self, provider: &FfmpegProvider) -> anyhow::Result<Timeline> {
        let mut timeline = Timeline::with_base_track(self.base_track);

        for raw in &self.clips {
            let spec = parse_clip_spec(raw)?;
            let (source, has_audio) = provider
                .import(&spec.path)
                .await
                .with_context(|| format!("failed to import {}", spec.path.display()))?;
            // Imported media covers the whole source; the spec narrows it.
            let mut clip = Clip::from_source(source, has_audio)
                .with_context(|| format!("unusable source {}", spec.path.display()))?;
            if let Some((in_secs, out_secs)) = spec.trim {
                clip.in_secs = in_secs;
                clip.out_secs = out_secs;
            }
            clip.track = spec.track.unwrap_or(self.base_track);
            clip.start_secs = spec
                .start
                .unwrap_or_else(|| timeline.track_end_secs(clip.track));
            clip.validate()
                .with_context(|| format!("invalid clip {raw:?}"))?;
            tracing::debug!(
                clip = %clip.id,
                source = %spec.path.display(),
                in_secs = clip.in_secs,
                out_secs = clip.out_secs,
                start = clip.start_secs,
                track = clip.track,
                has_audio,
                "Placed clip"
            );
            timeline.add_clip(clip)?;
        }

        let owner = timeline
            .clips()
            .first()
            .map(|c| c.id.clone())
            .ok_or_else(|| anyhow!("at least one --clip is required"))?;

        for raw in &self.texts {
            let spec = parse_overlay_spec(raw)?;
            let mut overlay = Overlay::text(spec.body, spec.position, spec.start, spec.end);
            overlay.opacity = spec.opacity;
            timeline
                .add_overlay(&owner, overlay)
                .with_context(|| format!("invalid text overlay {raw:?}"))?;
        }
        for raw in &self.images {
            let spec = parse_overlay_spec(raw)?;
            let mut overlay = Overlay::image(
                ImageRef::new(spec.body),
                spec.position,
                spec.start,
                spec.end,
            );
            overlay.opacity = spec.opacity;
            timeline
                .add_overlay(&owner, overlay)
                .with_context(|| format!("invalid image overlay {raw:?}"))?;
        }

        Ok(timeline)
    }
}

/// Parse `PATH[@IN:OUT][+START][#TRACK]`, peeling suffixes from the right.
pub fn parse_clip_spec(raw: &str) -> anyhow::Result<ClipSpec> {
    let mut rest = raw;

    let mut track = None;
    if let Some((head, tail)) = rest.rsplit_once('#') {
        if let Ok(value) = tail.parse::<u32>() {
            track = Some(value);
            rest = head;
        }
    }

    let mut start = None;
    if let Some((head, tail)) = rest.rsplit_once('+') {
        if let Ok(value) = tail.parse::<f64>() {
            start = Some(value);
            rest = head;
        }
    }

    let mut trim = None;
    if let Some((head, tail)) = rest.rsplit_once('@') {
        if let Some((a, b)) = tail.split_once(':') {
            if let (Ok(in_secs), Ok(out_secs)) = (a.parse::<f64>(), b.parse::<f64>()) {
                trim = Some((in_secs, out_secs));
                rest = head;
            }
        }
    }

    if rest.is_empty() {
        bail!("clip spec {raw:?} has no path");
    }
    Ok(ClipSpec {
        path: PathBuf::from(rest),
        trim,
        start,
        track,
    })
}

/// Parse `BODY@START-END[@X,Y[,OPACITY]]`.
pub fn parse_overlay_spec(raw: &str) -> anyhow::Result<OverlaySpec> {
    let (mut rest, last) = raw
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("overlay spec {raw:?} needs @START-END"))?;

    let mut position = DEFAULT_OVERLAY_POSITION;
    let mut opacity = None;
    let window = if let Some(window) = parse_window(last) {
        window
    } else {
        let placement: Vec<&str> = last.split(',').collect();
        let (x, y) = match placement.as_slice() {
            [x, y] | [x, y, _] => (x.parse::<f64>()?, y.parse::<f64>()?),
            _ => bail!("overlay spec {raw:?}: expected X,Y[,OPACITY], got {last:?}"),
        };
        position = Position::new(x, y);
        if let [_, _, o] = placement.as_slice() {
            opacity = Some(o.parse::<f64>()?);
        }

        let (head, window) = rest
            .rsplit_once('@')
            .ok_or_else(|| anyhow!("overlay spec {raw:?} needs @START-END"))?;
        rest = head;
        parse_window(window)
            .ok_or_else(|| anyhow!("overlay spec {raw:?}: bad window {window:?}"))?
    };

    if rest.is_empty() {
        bail!("overlay spec {raw:?} has no text or path");
    }
    Ok(OverlaySpec {
        body: rest.to_string(),
        start: window.0,
        end: window.1,
        position,
        opacity,
    })
}

fn parse_window(s: &str) -> Option<(f64, f64)> {
    let (a, b) = s.split_once('-')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}
