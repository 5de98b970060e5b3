//! Frame resolution: which clip and overlays are visible at an instant.
//!
//! Resolution is a pure function of the timeline and a time, so preview and
//! export see identical frames.
//!
//! Policies:
//! - Base clip: among clips on the timeline's base track that are active
//!   at `t`, the one with the highest `start` wins. Equal starts go to the
//!   clip inserted later.
//! - Overlays: every overlay active at `t`, ordered by the owning clip's
//!   insertion index, then by position in that clip's overlay list. This
//!   order is the z-order; later entries are drawn on top.

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::clip::Clip;
use reelcut_project_model::overlay::Overlay;
use reelcut_project_model::timeline::Timeline;

/// The base picture for a resolved frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseFrame<'a> {
    pub clip: &'a Clip,

    /// Index of the clip in timeline insertion order.
    pub clip_index: usize,

    /// Source time to decode, in `[clip.in, clip.out)`.
    pub source_time: f64,
}

/// One overlay to draw, with its opacity already defaulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayInstance<'a> {
    pub clip: &'a Clip,
    pub clip_index: usize,
    pub overlay_index: usize,
    pub overlay: &'a Overlay,
    pub opacity: f64,
}

/// Everything visible at one timeline instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFrame<'a> {
    pub time_secs: f64,
    pub base: Option<BaseFrame<'a>>,
    pub overlays: Vec<OverlayInstance<'a>>,
}

impl ResolvedFrame<'_> {
    /// Nothing to draw: no base clip and no overlays.
    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.overlays.is_empty()
    }
}

/// Resolve the frame visible at timeline time `t`.
///
/// Negative or NaN times resolve to an empty frame. A clip with an empty
/// trim window or an overlay with an empty window is reported as an
/// [`ReelcutError::InvariantViolation`]; such data can only come from a
/// corrupted timeline.
pub fn resolve(timeline: &Timeline, t: f64) -> ReelcutResult<ResolvedFrame<'_>> {
    let mut frame = ResolvedFrame {
        time_secs: t,
        base: None,
        overlays: Vec::new(),
    };
    if !(t >= 0.0) {
        return Ok(frame);
    }

    let base_track = timeline.base_track();
    for (clip_index, clip) in timeline.clips().iter().enumerate() {
        if !(clip.in_secs < clip.out_secs) {
            return Err(ReelcutError::invariant(format!(
                "clip {} has empty trim window [{}, {})",
                clip.id, clip.in_secs, clip.out_secs
            )));
        }

        if clip.track == base_track {
            if let Some(source_time) = clip.source_time_at(t) {
                let replaces = match &frame.base {
                    None => true,
                    Some(current) => clip.start_secs >= current.clip.start_secs,
                };
                if replaces {
                    frame.base = Some(BaseFrame {
                        clip,
                        clip_index,
                        source_time,
                    });
                }
            }
        }

        for (overlay_index, overlay) in clip.overlays.iter().enumerate() {
            if !(overlay.start_secs < overlay.end_secs) {
                return Err(ReelcutError::invariant(format!(
                    "overlay {overlay_index} of clip {} has empty window [{}, {})",
                    clip.id, overlay.start_secs, overlay.end_secs
                )));
            }
            if overlay.is_active_at(t) {
                frame.overlays.push(OverlayInstance {
                    clip,
                    clip_index,
                    overlay_index,
                    overlay,
                    opacity: overlay.effective_opacity(),
                });
            }
        }
    }

    if let Some(base) = &frame.base {
        let clip = base.clip;
        if !(base.source_time >= clip.in_secs && base.source_time < clip.out_secs) {
            return Err(ReelcutError::invariant(format!(
                "source time {} for clip {} is outside [{}, {})",
                base.source_time, clip.id, clip.in_secs, clip.out_secs
            )));
        }
    }

    Ok(frame)
}
